// tests/quiz_session_tests.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use quizbox::{
    config::{Config, HashCost},
    engine::{SessionStatus, StartError},
    error::AppError,
    models::{
        question::{Question, Quiz, SaveQuiz},
        user::Account,
    },
    state::AppState,
    store::{MemoryStore, RecordStore},
};
use tokio::time::sleep;

fn test_config() -> Config {
    Config {
        rust_log: "error".to_string(),
        question_time_secs: 30,
        hash_cost: HashCost {
            memory_kib: 64,
            iterations: 1,
        },
        ..Config::default()
    }
}

fn spawn_app_on(backend: Arc<dyn RecordStore>) -> AppState {
    AppState::new(backend, test_config())
}

fn spawn_app() -> AppState {
    spawn_app_on(Arc::new(MemoryStore::new()))
}

fn question(id: &str, correct: &str) -> Question {
    Question {
        id: id.to_string(),
        text: format!("Question {}", id),
        options: vec!["A".to_string(), "B".to_string(), "C".to_string()],
        correct_answer: correct.to_string(),
    }
}

async fn seed_quiz(state: &AppState, count: usize) -> Quiz {
    let questions = (1..=count).map(|i| question(&format!("q{}", i), "A")).collect();
    state
        .quizzes
        .save(SaveQuiz {
            id: None,
            title: "Timed".to_string(),
            description: "Countdown checks".to_string(),
            time_limit_secs: 300,
            questions,
        })
        .await
        .unwrap()
}

async fn seed_user(state: &AppState) -> Account {
    state
        .accounts
        .create_user("player@example.com", "secret")
        .await
        .unwrap()
}

/// Wraps a memory store and fails score writes while `fail_scores` is set.
struct FlakyStore {
    inner: MemoryStore,
    fail_scores: AtomicBool,
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn load(&self, bucket: &str) -> Result<Option<String>, AppError> {
        self.inner.load(bucket).await
    }

    async fn save(&self, bucket: &str, content: String) -> Result<(), AppError> {
        if bucket == "scores" && self.fail_scores.load(Ordering::SeqCst) {
            return Err(AppError::Storage("disk full".to_string()));
        }
        self.inner.save(bucket, content).await
    }

    async fn remove(&self, bucket: &str) -> Result<(), AppError> {
        self.inner.remove(bucket).await
    }
}

#[tokio::test]
async fn start_rejects_unknown_quiz() {
    let state = spawn_app();
    let account = seed_user(&state).await;

    let result = state.start_quiz(&account, "missing").await;
    assert!(matches!(result, Err(StartError::QuizNotFound(id)) if id == "missing"));
}

#[tokio::test]
async fn start_rejects_quiz_without_questions() {
    let state = spawn_app();
    let account = seed_user(&state).await;
    let quiz = seed_quiz(&state, 0).await;

    let result = state.start_quiz(&account, &quiz.id).await;
    assert_eq!(
        result.err(),
        Some(StartError::NoQuestions {
            quiz_id: quiz.id.clone(),
            title: "Timed".to_string(),
        })
    );
}

#[tokio::test(start_paused = true)]
async fn fresh_session_shows_first_question_and_full_countdown() {
    let state = spawn_app();
    let account = seed_user(&state).await;
    let quiz = seed_quiz(&state, 3).await;

    let session = state.start_quiz(&account, &quiz.id).await.unwrap();
    let view = session.view();

    assert_eq!(view.status, SessionStatus::InProgress);
    assert_eq!(view.current_index, 0);
    assert_eq!(view.question_count, 3);
    assert_eq!(view.question.id, "q1");
    assert_eq!(view.seconds_left, 30);
    assert_eq!(view.display_time, "00:30");
    assert_eq!(view.selection, None);
    assert!(view.score.is_none());
}

#[tokio::test(start_paused = true)]
async fn countdown_expiry_advances_to_next_question() {
    let state = spawn_app();
    let account = seed_user(&state).await;
    let quiz = seed_quiz(&state, 3).await;
    let session = state.start_quiz(&account, &quiz.id).await.unwrap();

    sleep(Duration::from_millis(10_500)).await;
    assert_eq!(session.seconds_left(), 20);
    assert_eq!(session.display_time(), "00:20");

    sleep(Duration::from_secs(20)).await;
    let view = session.view();
    assert_eq!(view.current_index, 1);
    assert_eq!(view.seconds_left, 30);
    assert_eq!(view.status, SessionStatus::InProgress);
}

#[tokio::test(start_paused = true)]
async fn manual_advance_replaces_the_running_countdown() {
    let state = spawn_app();
    let account = seed_user(&state).await;
    let quiz = seed_quiz(&state, 3).await;
    let session = state.start_quiz(&account, &quiz.id).await.unwrap();

    sleep(Duration::from_millis(20_500)).await;
    session.advance().await.unwrap();
    assert_eq!(session.view().current_index, 1);
    assert_eq!(session.seconds_left(), 30);

    // The first question's countdown would have expired here.
    sleep(Duration::from_secs(10)).await;
    let view = session.view();
    assert_eq!(view.current_index, 1);
    assert_eq!(view.seconds_left, 21);

    sleep(Duration::from_millis(18_500)).await;
    assert_eq!(session.view().current_index, 1);
    assert_eq!(session.seconds_left(), 2);
}

#[tokio::test(start_paused = true)]
async fn advance_on_last_question_is_noop() {
    let state = spawn_app();
    let account = seed_user(&state).await;
    let quiz = seed_quiz(&state, 1).await;
    let session = state.start_quiz(&account, &quiz.id).await.unwrap();

    sleep(Duration::from_millis(5_500)).await;
    session.advance().await.unwrap();

    assert_eq!(session.view().current_index, 0);
    assert_eq!(session.seconds_left(), 25);
}

#[tokio::test(start_paused = true)]
async fn retreat_keeps_the_countdown_running() {
    let state = spawn_app();
    let account = seed_user(&state).await;
    let quiz = seed_quiz(&state, 3).await;
    let session = state.start_quiz(&account, &quiz.id).await.unwrap();

    session.retreat().await.unwrap();
    assert_eq!(session.view().current_index, 0);

    sleep(Duration::from_millis(5_500)).await;
    session.advance().await.unwrap();
    sleep(Duration::from_millis(4_500)).await;
    assert_eq!(session.seconds_left(), 26);

    session.retreat().await.unwrap();
    let view = session.view();
    assert_eq!(view.current_index, 0);
    assert_eq!(view.seconds_left, 26);
}

#[tokio::test(start_paused = true)]
async fn selection_is_kept_per_question() {
    let state = spawn_app();
    let account = seed_user(&state).await;
    let quiz = seed_quiz(&state, 2).await;
    let session = state.start_quiz(&account, &quiz.id).await.unwrap();

    session.select_option("B").await.unwrap();
    session.select_option("A").await.unwrap();
    assert_eq!(session.selection(), Some("A".to_string()));
    assert_eq!(session.view().answered, 1);

    session.advance().await.unwrap();
    assert_eq!(session.selection(), None);
    session.select_option("C").await.unwrap();

    session.retreat().await.unwrap();
    assert_eq!(session.selection(), Some("A".to_string()));

    let answers = session.answers().await;
    assert_eq!(answers.get("q1").map(String::as_str), Some("A"));
    assert_eq!(answers.get("q2").map(String::as_str), Some("C"));
}

#[tokio::test(start_paused = true)]
async fn manual_submit_records_one_score() {
    let state = spawn_app();
    let account = seed_user(&state).await;
    let quiz = seed_quiz(&state, 3).await;
    let session = state.start_quiz(&account, &quiz.id).await.unwrap();

    session.select_option("A").await.unwrap();
    session.advance().await.unwrap();
    session.select_option("B").await.unwrap();

    let score = session.submit().await.unwrap();
    assert_eq!(score.score, 1);
    assert_eq!(score.total_questions, 3);
    assert_eq!(score.quiz_id, quiz.id);
    assert_eq!(score.quiz_title, "Timed");
    assert_eq!(score.user_id, account.id);
    assert_eq!(score.user_email, "player@example.com");
    assert_eq!(score.answers.as_ref().map(|a| a.len()), Some(2));
    assert_eq!(score.percentage(), 33);
    assert!(!score.passed());

    let view = session.view();
    assert_eq!(view.status, SessionStatus::Completed);
    assert_eq!(view.score.as_ref(), Some(&score));

    assert_eq!(state.scores.all().await, vec![score]);
}

#[tokio::test(start_paused = true)]
async fn submitting_twice_returns_the_same_score() {
    let state = spawn_app();
    let account = seed_user(&state).await;
    let quiz = seed_quiz(&state, 2).await;
    let session = state.start_quiz(&account, &quiz.id).await.unwrap();

    let first = session.submit().await.unwrap();
    let second = session.submit().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(state.scores.all().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn completed_session_ignores_further_input() {
    let state = spawn_app();
    let account = seed_user(&state).await;
    let quiz = seed_quiz(&state, 2).await;
    let session = state.start_quiz(&account, &quiz.id).await.unwrap();

    session.submit().await.unwrap();
    session.select_option("A").await.unwrap();
    session.advance().await.unwrap();

    let view = session.view();
    assert_eq!(view.current_index, 0);
    assert_eq!(view.answered, 0);

    // No countdown left to fire.
    sleep(Duration::from_secs(120)).await;
    assert_eq!(session.seconds_left(), 30);
    assert_eq!(state.scores.all().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn timeout_on_last_question_submits() {
    let state = spawn_app();
    let account = seed_user(&state).await;
    let quiz = seed_quiz(&state, 2).await;
    let session = state.start_quiz(&account, &quiz.id).await.unwrap();

    session.select_option("A").await.unwrap();

    let score = session.wait_for_completion().await.unwrap();
    assert_eq!(score.score, 1);
    assert_eq!(score.total_questions, 2);
    assert_eq!(score.answers.as_ref().map(|a| a.len()), Some(1));
    assert_eq!(session.status(), SessionStatus::Completed);
    assert_eq!(state.scores.all().await, vec![score]);
}

async fn race_submit_against_final_tick(offset_ms: u64) {
    let state = spawn_app();
    let account = seed_user(&state).await;
    let quiz = seed_quiz(&state, 2).await;
    let session = state.start_quiz(&account, &quiz.id).await.unwrap();
    session.select_option("A").await.unwrap();

    // Two 30 s questions: the last tick lands at 60 s.
    sleep(Duration::from_millis(offset_ms)).await;
    let (submitted, completed) = tokio::join!(session.submit(), session.wait_for_completion());
    let submitted = submitted.unwrap();
    let completed = completed.unwrap();

    assert_eq!(submitted, completed, "offset {} ms", offset_ms);
    assert_eq!(state.scores.all().await, vec![submitted], "offset {} ms", offset_ms);
    assert_eq!(session.status(), SessionStatus::Completed);
}

#[tokio::test(start_paused = true)]
async fn submit_just_before_final_tick_records_one_score() {
    race_submit_against_final_tick(59_999).await;
}

#[tokio::test(start_paused = true)]
async fn submit_at_final_tick_records_one_score() {
    race_submit_against_final_tick(60_000).await;
}

#[tokio::test(start_paused = true)]
async fn submit_just_after_final_tick_records_one_score() {
    race_submit_against_final_tick(60_001).await;
}

#[tokio::test(start_paused = true)]
async fn watchers_see_countdown_ticks() {
    let state = spawn_app();
    let account = seed_user(&state).await;
    let quiz = seed_quiz(&state, 2).await;
    let session = state.start_quiz(&account, &quiz.id).await.unwrap();

    let mut views = session.watch();
    views.changed().await.unwrap();
    assert_eq!(views.borrow_and_update().seconds_left, 29);
}

#[tokio::test(start_paused = true)]
async fn cancelled_session_never_submits() {
    let state = spawn_app();
    let account = seed_user(&state).await;
    let quiz = seed_quiz(&state, 1).await;
    let session = state.start_quiz(&account, &quiz.id).await.unwrap();

    session.select_option("A").await.unwrap();
    session.cancel();

    sleep(Duration::from_secs(120)).await;
    assert!(state.scores.all().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_submission_returns_to_in_progress() {
    let store = Arc::new(FlakyStore {
        inner: MemoryStore::new(),
        fail_scores: AtomicBool::new(false),
    });
    let state = spawn_app_on(store.clone());
    let account = seed_user(&state).await;
    let quiz = seed_quiz(&state, 2).await;
    let session = state.start_quiz(&account, &quiz.id).await.unwrap();

    session.select_option("A").await.unwrap();
    store.fail_scores.store(true, Ordering::SeqCst);

    let err = session.submit().await.unwrap_err();
    assert!(matches!(err, AppError::Storage(_)));

    let view = session.view();
    assert_eq!(view.status, SessionStatus::InProgress);
    assert_eq!(view.answered, 1);
    assert!(state.scores.all().await.is_empty());

    store.fail_scores.store(false, Ordering::SeqCst);
    let score = session.submit().await.unwrap();
    assert_eq!(score.score, 1);
    assert_eq!(state.scores.all().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn unanswered_questions_are_absent_from_the_score() {
    let state = spawn_app();
    let account = seed_user(&state).await;
    let quiz = seed_quiz(&state, 3).await;
    let session = state.start_quiz(&account, &quiz.id).await.unwrap();

    session.select_option("A").await.unwrap();
    session.advance().await.unwrap();
    session.advance().await.unwrap();
    assert_eq!(session.view().current_index, 2);

    let score = session.submit().await.unwrap();
    assert_eq!(score.total_questions, 3);
    assert_eq!(score.score, 1);
    let answers = score.answers.unwrap();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers.get("q1").map(String::as_str), Some("A"));
}
