// src/state.rs

use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::Config,
    engine::{QuizSession, StartError},
    error::AppError,
    models::user::Account,
    services::{
        accounts::AccountCollection, notifications::NotificationLog, quizzes::QuizCollection,
        scores::ScoreCollection, session_slot::SessionSlot,
    },
    store::{self, RecordStore, Records},
};

/// Every collection, wired to one record store.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub records: Records,
    pub accounts: AccountCollection,
    pub quizzes: QuizCollection,
    pub scores: ScoreCollection,
    pub notifications: NotificationLog,
    pub slot: SessionSlot,
}

impl AppState {
    pub fn new(backend: Arc<dyn RecordStore>, config: Config) -> Self {
        let records = Records::new(backend).with_latency(Duration::from_millis(config.simulated_latency_ms));

        let scores = ScoreCollection::new(records.clone());
        let notifications = NotificationLog::new(records.clone());
        let slot = SessionSlot::new(records.clone());
        let quizzes = QuizCollection::new(records.clone());
        let accounts = AccountCollection::new(
            records.clone(),
            scores.clone(),
            notifications.clone(),
            slot.clone(),
            config.hash_cost,
        );

        Self {
            config,
            records,
            accounts,
            quizzes,
            scores,
            notifications,
            slot,
        }
    }

    /// Opens the backend named by `config.backend`.
    pub async fn open(config: Config) -> Result<Self, AppError> {
        let backend = store::open(&config).await?;
        Ok(Self::new(backend, config))
    }

    /// Seeds the owner administrator and the sample quizzes on first run.
    pub async fn initialize(&self) -> Result<(), AppError> {
        self.accounts
            .initialize_defaults(&self.config.admin_email, &self.config.admin_password)
            .await?;
        self.quizzes.initialize().await?;
        Ok(())
    }

    pub async fn start_quiz(&self, account: &Account, quiz_id: &str) -> Result<QuizSession, StartError> {
        QuizSession::start(
            &self.quizzes,
            self.scores.clone(),
            account.clone(),
            quiz_id,
            self.config.question_time_secs,
        )
        .await
    }
}
