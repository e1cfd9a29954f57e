// src/models/score.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::PASSING_SCORE_PERCENTAGE;

/// One quiz attempt, stored in the `scores` bucket.
///
/// `quiz_title` is a snapshot taken at submission and is never refreshed when the
/// quiz is edited. `user_email` is also a snapshot, but account email changes are
/// propagated to it explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub id: String,
    pub quiz_id: String,
    pub quiz_title: String,
    pub user_id: String,
    pub user_email: String,

    /// Number of correct answers.
    pub score: u32,
    pub total_questions: u32,
    pub date: DateTime<Utc>,

    /// Question id -> selected option text. Unanswered questions are absent.
    /// Older records may not carry a map at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<BTreeMap<String, String>>,
}

impl Score {
    /// Rounded percentage of correct answers; 0 for a quiz without questions.
    pub fn percentage(&self) -> u32 {
        if self.total_questions == 0 {
            return 0;
        }
        ((self.score as f64 / self.total_questions as f64) * 100.0).round() as u32
    }

    pub fn passed(&self) -> bool {
        self.percentage() as f64 >= PASSING_SCORE_PERCENTAGE
    }
}

/// Per-account activity summary for the admin user list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub user_id: String,
    pub email: String,
    /// Distinct quizzes attempted.
    pub quizzes_taken: usize,
    /// Date of the latest attempt; `None` if the user never took a quiz.
    pub last_active: Option<DateTime<Utc>>,
}

/// One row of an attempt review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    pub question_id: String,
    pub question: String,
    pub user_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
}
