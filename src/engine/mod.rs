// src/engine/mod.rs

//! Timed quiz attempt.
//!
//! A session moves `InProgress -> Submitting -> Completed`. Loading happens inside
//! `QuizSession::start`, which reports a missing quiz and a quiz without questions as
//! distinct `StartError`s instead of producing a session.
//!
//! Each question gets its own countdown of `question_time_secs`. When it runs out the
//! session advances, or submits if it is on the last question. User actions and
//! countdown ticks are both fed through `Shared::apply` under one lock, so a manual
//! submit racing the final tick yields exactly one Score.

pub mod countdown;

use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::sync::{Arc, PoisonError, Weak};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    engine::countdown::{format_remaining, spawn_ticker},
    error::AppError,
    models::{
        question::{PublicQuestion, Question, Quiz},
        score::Score,
        user::Account,
    },
    services::{quizzes::QuizCollection, scores::ScoreCollection},
};

/// Why a session could not be entered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    /// The quiz id does not reference a stored quiz.
    #[error("Quiz '{0}' does not exist")]
    QuizNotFound(String),

    /// The quiz exists but has no content.
    #[error("Quiz '{title}' has no questions")]
    NoQuestions { quiz_id: String, title: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    InProgress,
    Submitting,
    Completed,
}

/// Snapshot of a session for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub status: SessionStatus,
    pub quiz_id: String,
    pub quiz_title: String,
    pub current_index: usize,
    pub question_count: usize,
    pub question: PublicQuestion,
    /// Option chosen for the current question, if any.
    pub selection: Option<String>,
    pub answered: usize,
    pub seconds_left: u32,
    pub display_time: String,
    /// Set once the session is completed.
    pub score: Option<Score>,
}

enum Input {
    Select(String),
    Advance,
    Retreat,
    Submit,
    Tick { generation: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    User,
    Timer,
}

enum Phase {
    InProgress,
    Submitting,
    Completed(Score),
}

struct Attempt {
    quiz: Quiz,
    account: Account,
    current_index: usize,
    /// Only grows or overwrites during a session.
    answers: BTreeMap<String, String>,
    seconds_left: u32,
    /// Identifies the live countdown; ticks from older countdowns are ignored.
    generation: u64,
    phase: Phase,
}

impl Attempt {
    fn is_open(&self) -> bool {
        matches!(self.phase, Phase::InProgress)
    }

    fn is_last(&self) -> bool {
        self.current_index + 1 >= self.quiz.questions.len()
    }

    fn current(&self) -> &Question {
        &self.quiz.questions[self.current_index]
    }

    fn status(&self) -> SessionStatus {
        match self.phase {
            Phase::InProgress => SessionStatus::InProgress,
            Phase::Submitting => SessionStatus::Submitting,
            Phase::Completed(_) => SessionStatus::Completed,
        }
    }

    fn view(&self) -> SessionView {
        let question = self.current();
        SessionView {
            status: self.status(),
            quiz_id: self.quiz.id.clone(),
            quiz_title: self.quiz.title.clone(),
            current_index: self.current_index,
            question_count: self.quiz.questions.len(),
            question: PublicQuestion::from(question),
            selection: self.answers.get(&question.id).cloned(),
            answered: self.answers.len(),
            seconds_left: self.seconds_left,
            display_time: format_remaining(self.seconds_left),
            score: match &self.phase {
                Phase::Completed(score) => Some(score.clone()),
                _ => None,
            },
        }
    }

    fn build_score(&self) -> Score {
        Score {
            id: Uuid::new_v4().to_string(),
            quiz_id: self.quiz.id.clone(),
            quiz_title: self.quiz.title.clone(),
            user_id: self.account.id.clone(),
            user_email: self.account.email.clone(),
            score: grade(&self.quiz, &self.answers),
            total_questions: self.quiz.questions.len() as u32,
            date: Utc::now(),
            answers: Some(self.answers.clone()),
        }
    }
}

/// Number of questions whose captured answer equals the correct answer exactly.
pub(crate) fn grade(quiz: &Quiz, answers: &BTreeMap<String, String>) -> u32 {
    quiz.questions
        .iter()
        .filter(|q| answers.get(&q.id) == Some(&q.correct_answer))
        .count() as u32
}

struct Shared {
    attempt: Mutex<Attempt>,
    countdown: std::sync::Mutex<Option<JoinHandle<()>>>,
    scores: ScoreCollection,
    question_time_secs: u32,
    views: watch::Sender<SessionView>,
}

struct Outcome {
    score: Option<Score>,
    /// For ticks: whether the countdown that sent it is still the live one.
    ticking: bool,
}

impl Shared {
    /// The single transition function.
    async fn apply(self: &Arc<Self>, input: Input) -> Result<Outcome, AppError> {
        let mut attempt = self.attempt.lock().await;

        let tick_generation = match input {
            Input::Tick { generation } => Some(generation),
            _ => None,
        };

        let result = match input {
            Input::Select(option) => {
                if attempt.is_open() {
                    let id = attempt.current().id.clone();
                    attempt.answers.insert(id, option);
                }
                Ok(None)
            }
            Input::Advance => {
                self.advance(&mut attempt, Trigger::User);
                Ok(None)
            }
            Input::Retreat => {
                // The countdown keeps running.
                if attempt.is_open() && attempt.current_index > 0 {
                    attempt.current_index -= 1;
                }
                Ok(None)
            }
            Input::Submit => self.submit(&mut attempt, Trigger::User).await.map(Some),
            Input::Tick { generation } => {
                if !attempt.is_open() || attempt.generation != generation {
                    Ok(None)
                } else {
                    attempt.seconds_left = attempt.seconds_left.saturating_sub(1);
                    if attempt.seconds_left > 0 {
                        Ok(None)
                    } else if attempt.is_last() {
                        self.submit(&mut attempt, Trigger::Timer).await.map(Some)
                    } else {
                        self.advance(&mut attempt, Trigger::Timer);
                        Ok(None)
                    }
                }
            }
        };

        let ticking = tick_generation.is_some_and(|g| attempt.is_open() && attempt.generation == g);
        self.views.send_replace(attempt.view());

        result.map(|score| Outcome { score, ticking })
    }

    fn advance(self: &Arc<Self>, attempt: &mut Attempt, trigger: Trigger) {
        if !attempt.is_open() || attempt.is_last() {
            return;
        }
        attempt.current_index += 1;
        self.restart_countdown(attempt, trigger);
    }

    async fn submit(self: &Arc<Self>, attempt: &mut Attempt, trigger: Trigger) -> Result<Score, AppError> {
        if let Phase::Completed(score) = &attempt.phase {
            return Ok(score.clone());
        }

        attempt.phase = Phase::Submitting;
        self.views.send_replace(attempt.view());

        let score = attempt.build_score();
        match self.scores.append(score.clone()).await {
            Ok(()) => {
                tracing::info!(
                    quiz_id = %score.quiz_id,
                    user_id = %score.user_id,
                    score = score.score,
                    total = score.total_questions,
                    timed_out = trigger == Trigger::Timer,
                    "Quiz submitted"
                );
                attempt.phase = Phase::Completed(score.clone());
                self.replace_countdown(None, trigger);
                Ok(score)
            }
            Err(e) => {
                tracing::error!(quiz_id = %score.quiz_id, error = %e, "Failed to record score");
                attempt.phase = Phase::InProgress;
                Err(e)
            }
        }
    }

    fn restart_countdown(self: &Arc<Self>, attempt: &mut Attempt, trigger: Trigger) {
        attempt.generation += 1;
        attempt.seconds_left = self.question_time_secs;
        let handle = spawn_countdown(Arc::downgrade(self), attempt.generation);
        self.replace_countdown(Some(handle), trigger);
    }

    fn replace_countdown(&self, next: Option<JoinHandle<()>>, trigger: Trigger) {
        let previous = {
            let mut slot = self.countdown.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *slot, next)
        };
        // A timer-driven change runs on the previous countdown task itself,
        // which sees the generation bump and stops.
        if let (Some(previous), Trigger::User) = (previous, trigger) {
            previous.abort();
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let slot = self.countdown.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}

fn spawn_countdown(session: Weak<Shared>, generation: u64) -> JoinHandle<()> {
    spawn_ticker(move || {
        let session = session.clone();
        async move {
            let Some(shared) = session.upgrade() else {
                return ControlFlow::Break(());
            };
            match shared.apply(Input::Tick { generation }).await {
                Ok(outcome) if outcome.ticking => ControlFlow::Continue(()),
                Ok(_) => ControlFlow::Break(()),
                Err(e) => {
                    tracing::warn!(error = %e, "Timed-out submission failed, retrying on next tick");
                    ControlFlow::Continue(())
                }
            }
        }
    })
}

/// One in-progress attempt at a quiz by one account.
///
/// Dropping the session cancels its countdown.
pub struct QuizSession {
    shared: Arc<Shared>,
}

impl QuizSession {
    /// Loads the quiz and starts the first question's countdown.
    pub async fn start(
        quizzes: &QuizCollection,
        scores: ScoreCollection,
        account: Account,
        quiz_id: &str,
        question_time_secs: u32,
    ) -> Result<Self, StartError> {
        let quiz = quizzes
            .get_by_id(quiz_id)
            .await
            .ok_or_else(|| StartError::QuizNotFound(quiz_id.to_string()))?;

        if quiz.questions.is_empty() {
            return Err(StartError::NoQuestions {
                quiz_id: quiz.id,
                title: quiz.title,
            });
        }

        let question_time_secs = question_time_secs.max(1);
        let attempt = Attempt {
            quiz,
            account,
            current_index: 0,
            answers: BTreeMap::new(),
            seconds_left: question_time_secs,
            generation: 0,
            phase: Phase::InProgress,
        };
        let (views, _) = watch::channel(attempt.view());

        let shared = Arc::new(Shared {
            attempt: Mutex::new(attempt),
            countdown: std::sync::Mutex::new(None),
            scores,
            question_time_secs,
            views,
        });

        {
            let mut attempt = shared.attempt.lock().await;
            shared.restart_countdown(&mut attempt, Trigger::User);
            shared.views.send_replace(attempt.view());
            tracing::info!(
                quiz_id = %attempt.quiz.id,
                user_id = %attempt.account.id,
                questions = attempt.quiz.questions.len(),
                "Quiz session started"
            );
        }

        Ok(Self { shared })
    }

    pub fn view(&self) -> SessionView {
        self.shared.views.borrow().clone()
    }

    /// Receiver updated after every transition, including countdown ticks.
    pub fn watch(&self) -> watch::Receiver<SessionView> {
        self.shared.views.subscribe()
    }

    pub fn status(&self) -> SessionStatus {
        self.shared.views.borrow().status
    }

    pub fn current_question(&self) -> PublicQuestion {
        self.shared.views.borrow().question.clone()
    }

    pub fn selection(&self) -> Option<String> {
        self.shared.views.borrow().selection.clone()
    }

    pub fn seconds_left(&self) -> u32 {
        self.shared.views.borrow().seconds_left
    }

    /// `MM:SS`.
    pub fn display_time(&self) -> String {
        self.shared.views.borrow().display_time.clone()
    }

    pub async fn answers(&self) -> BTreeMap<String, String> {
        self.shared.attempt.lock().await.answers.clone()
    }

    /// Records or overwrites the answer for the current question. Does not advance.
    pub async fn select_option(&self, option: impl Into<String>) -> Result<(), AppError> {
        self.shared.apply(Input::Select(option.into())).await.map(|_| ())
    }

    /// Next question with a fresh countdown. No-op on the last question.
    pub async fn advance(&self) -> Result<(), AppError> {
        self.shared.apply(Input::Advance).await.map(|_| ())
    }

    /// Previous question. The countdown is not reset.
    pub async fn retreat(&self) -> Result<(), AppError> {
        self.shared.apply(Input::Retreat).await.map(|_| ())
    }

    /// Scores the attempt and appends it to the score collection.
    /// Once completed, further calls return the same Score without appending again.
    pub async fn submit(&self) -> Result<Score, AppError> {
        self.shared
            .apply(Input::Submit)
            .await?
            .score
            .ok_or_else(|| AppError::Internal("Submission produced no score".to_string()))
    }

    /// Resolves with the terminal Score, whether it came from `submit` or a timeout.
    pub async fn wait_for_completion(&self) -> Result<Score, AppError> {
        let mut views = self.shared.views.subscribe();
        let view = views
            .wait_for(|v| v.score.is_some())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        view.score
            .clone()
            .ok_or_else(|| AppError::Internal("Completed session without score".to_string()))
    }

    /// Leaves the session. The countdown is stopped; nothing is submitted.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for QuizSession {
    fn drop(&mut self) {
        self.shared.replace_countdown(None, Trigger::User);
    }
}
