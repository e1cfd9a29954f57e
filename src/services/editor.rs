// src/services/editor.rs

use std::borrow::Cow;

use serde::Serialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    config::NEW_QUIZ_TIME_LIMIT_SECS,
    error::AppError,
    models::question::{GeneratedQuestion, Question, Quiz, SaveQuiz},
    services::{generator::QuestionGenerator, quizzes::QuizCollection},
};

/// A question being edited. `id` is `None` until the draft is first saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftQuestion {
    pub id: Option<String>,
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

/// Admin editor state for creating or editing a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct QuizDraft {
    pub id: Option<String>,

    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters."))]
    pub title: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters."))]
    pub description: String,

    #[validate(range(min = 1, message = "Time limit must be at least one second."))]
    pub time_limit_secs: u32,

    #[validate(custom(function = validate_questions))]
    pub questions: Vec<DraftQuestion>,
}

impl QuizDraft {
    /// Empty draft for a new quiz.
    pub fn blank() -> Self {
        Self {
            id: None,
            title: String::new(),
            description: String::new(),
            time_limit_secs: NEW_QUIZ_TIME_LIMIT_SECS,
            questions: Vec::new(),
        }
    }

    pub fn from_quiz(quiz: &Quiz) -> Self {
        Self {
            id: Some(quiz.id.clone()),
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            time_limit_secs: quiz.time_limit_secs,
            questions: quiz
                .questions
                .iter()
                .map(|q| DraftQuestion {
                    id: Some(q.id.clone()),
                    text: q.text.clone(),
                    options: q.options.clone(),
                    correct_answer: q.correct_answer.clone(),
                })
                .collect(),
        }
    }

    /// Appends a question with four empty options.
    pub fn add_blank_question(&mut self) {
        self.questions.push(DraftQuestion {
            id: None,
            text: String::new(),
            options: vec![String::new(); 4],
            correct_answer: String::new(),
        });
    }

    /// Out-of-range indices are ignored.
    pub fn remove_question(&mut self, index: usize) {
        if index < self.questions.len() {
            self.questions.remove(index);
        }
    }

    pub fn append_generated(&mut self, generated: Vec<GeneratedQuestion>) {
        self.questions.extend(generated.into_iter().map(|g| DraftQuestion {
            id: None,
            text: g.question,
            options: g.options,
            correct_answer: g.correct_answer,
        }));
    }

    /// Asks the generator for `count` questions on `topic` and appends them.
    /// An empty topic or zero count does nothing. Returns how many were added.
    pub async fn generate_into(
        &mut self,
        generator: &dyn QuestionGenerator,
        topic: &str,
        count: usize,
    ) -> Result<usize, AppError> {
        if topic.trim().is_empty() || count == 0 {
            return Ok(0);
        }

        let generated = generator.generate(topic, count).await.map_err(|e| {
            tracing::error!(topic = %topic, error = %e, "Question generation failed");
            match e {
                AppError::Generator(_) => e,
                other => AppError::Generator(other.to_string()),
            }
        })?;

        let added = generated.len();
        self.append_generated(generated);
        Ok(added)
    }

    pub fn check(&self) -> Result<(), AppError> {
        self.validate()
            .map_err(|validation_errors| AppError::Validation(validation_errors.to_string()))
    }

    /// Validates and assigns a fresh id to every question that has none.
    /// Existing question ids are never changed.
    pub fn finalize(self) -> Result<SaveQuiz, AppError> {
        self.check()?;

        let questions = self
            .questions
            .into_iter()
            .map(|q| Question {
                id: q
                    .id
                    .filter(|id| !id.is_empty())
                    .unwrap_or_else(|| format!("q-{}", Uuid::new_v4())),
                text: q.text,
                options: q.options,
                correct_answer: q.correct_answer,
            })
            .collect();

        Ok(SaveQuiz {
            id: self.id,
            title: self.title,
            description: self.description,
            time_limit_secs: self.time_limit_secs,
            questions,
        })
    }

    pub async fn save(self, quizzes: &QuizCollection) -> Result<Quiz, AppError> {
        quizzes.save(self.finalize()?).await
    }
}

fn invalid(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Owned(message));
    err
}

/// Every question needs text, at least one non-empty option, and a correct answer among its options.
fn validate_questions(questions: &[DraftQuestion]) -> Result<(), ValidationError> {
    for (index, q) in questions.iter().enumerate() {
        let n = index + 1;
        if q.text.trim().is_empty() {
            return Err(invalid("question_text_empty", format!("Question {} has no text.", n)));
        }
        if q.options.is_empty() || q.options.iter().any(|o| o.trim().is_empty()) {
            return Err(invalid("options_invalid", format!("Question {} has an empty option.", n)));
        }
        if !q.options.contains(&q.correct_answer) {
            return Err(invalid(
                "correct_answer_missing",
                format!("Question {} has no correct answer selected.", n),
            ));
        }
    }
    Ok(())
}
