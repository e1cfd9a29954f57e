// src/models/question.rs

use serde::{Deserialize, Serialize};

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Assigned once by the editor and never regenerated, so that
    /// `Score.answers` keys stay meaningful after the quiz is edited.
    pub id: String,

    pub text: String,

    /// Ordered list of choices.
    pub options: Vec<String>,

    /// Must equal one of `options`. Enforced by the editor, not by the store.
    pub correct_answer: String,
}

/// A quiz definition stored in the `quizzes` bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: String,
    pub title: String,
    pub description: String,
    pub time_limit_secs: u32,
    pub questions: Vec<Question>,
}

/// DTO for `QuizCollection::save`.
/// `id: None` (or an id that is not stored) creates a new quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveQuiz {
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub time_limit_secs: u32,
    pub questions: Vec<Question>,
}

impl SaveQuiz {
    pub(crate) fn into_quiz(self, id: String) -> Quiz {
        Quiz {
            id,
            title: self.title,
            description: self.description,
            time_limit_secs: self.time_limit_secs,
            questions: self.questions,
        }
    }
}

impl From<Quiz> for SaveQuiz {
    fn from(quiz: Quiz) -> Self {
        Self {
            id: Some(quiz.id),
            title: quiz.title,
            description: quiz.description,
            time_limit_secs: quiz.time_limit_secs,
            questions: quiz.questions,
        }
    }
}

/// Question as produced by the external generator (no id yet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

/// Question as shown while an attempt is running (no correct answer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id.clone(),
            text: q.text.clone(),
            options: q.options.clone(),
        }
    }
}
