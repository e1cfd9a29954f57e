// src/services/generator.rs

use async_trait::async_trait;
use serde_json::Value;

use crate::{error::AppError, models::question::GeneratedQuestion, utils::html::clean_html};

pub const UNTITLED_QUESTION: &str = "Untitled Question";

/// External question source used by the quiz editor, never by a quiz session.
///
/// Implementations fail with `AppError::Generator` when misconfigured or when the
/// upstream answer is unusable.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(&self, topic: &str, count: usize) -> Result<Vec<GeneratedQuestion>, AppError>;
}

/// Parses a raw generator response body.
pub fn parse_generated(body: &str) -> Result<Vec<GeneratedQuestion>, AppError> {
    let payload: Value = serde_json::from_str(body).map_err(|e| {
        tracing::error!(error = %e, "Generator returned invalid JSON");
        AppError::Generator(
            "Failed to generate questions. Please check the topic and try again.".to_string(),
        )
    })?;
    coerce_generated(&payload)
}

/// Turns a `{ "questions": [...] }` payload into well-formed questions.
///
/// Null or non-object entries are dropped. Missing text becomes `UNTITLED_QUESTION`,
/// non-list options become an empty list and a missing answer becomes an empty string.
/// All text is sanitised.
pub fn coerce_generated(payload: &Value) -> Result<Vec<GeneratedQuestion>, AppError> {
    let entries = payload
        .get("questions")
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::Generator("Invalid format received from the question generator.".to_string()))?;

    Ok(entries
        .iter()
        .filter_map(Value::as_object)
        .map(|entry| GeneratedQuestion {
            question: entry
                .get("question")
                .and_then(Value::as_str)
                .map(clean_html)
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| UNTITLED_QUESTION.to_string()),
            options: entry
                .get("options")
                .and_then(Value::as_array)
                .map(|options| options.iter().filter_map(Value::as_str).map(clean_html).collect())
                .unwrap_or_default(),
            correct_answer: entry
                .get("correctAnswer")
                .and_then(Value::as_str)
                .map(clean_html)
                .unwrap_or_default(),
        })
        .collect())
}
