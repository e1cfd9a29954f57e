// src/services/quizzes.rs

use uuid::Uuid;

use crate::{
    error::AppError,
    models::question::{Question, Quiz, SaveQuiz},
    store::{Bucket, Records},
};

/// CRUD over quiz definitions.
#[derive(Clone)]
pub struct QuizCollection {
    records: Records,
}

impl QuizCollection {
    pub fn new(records: Records) -> Self {
        Self { records }
    }

    /// Seeds the sample quizzes when the collection is empty.
    /// Returns whether anything was written.
    pub async fn initialize(&self) -> Result<bool, AppError> {
        let seeded = self
            .records
            .update(Bucket::Quizzes, |quizzes: &mut Vec<Quiz>| {
                if !quizzes.is_empty() {
                    return Err(AppError::Conflict("Quizzes already present".to_string()));
                }
                quizzes.extend(sample_quizzes());
                Ok(quizzes.len())
            })
            .await;

        match seeded {
            Ok(count) => {
                tracing::info!(count, "Seeded sample quizzes");
                Ok(true)
            }
            Err(AppError::Conflict(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn list(&self) -> Vec<Quiz> {
        self.records.simulate_latency().await;
        self.records.read_all(Bucket::Quizzes).await
    }

    pub async fn get_by_id(&self, id: &str) -> Option<Quiz> {
        self.list().await.into_iter().find(|q| q.id == id)
    }

    /// Updates in place when `quiz.id` names a stored quiz; otherwise appends it under a fresh id.
    /// Question ids are kept exactly as given.
    pub async fn save(&self, quiz: SaveQuiz) -> Result<Quiz, AppError> {
        self.records.simulate_latency().await;
        let saved = self
            .records
            .update(Bucket::Quizzes, move |quizzes: &mut Vec<Quiz>| {
                if let Some(id) = quiz.id.clone() {
                    if let Some(slot) = quizzes.iter_mut().find(|q| q.id == id) {
                        *slot = quiz.into_quiz(id);
                        return Ok(slot.clone());
                    }
                }
                let created = quiz.into_quiz(Uuid::new_v4().to_string());
                quizzes.push(created.clone());
                Ok(created)
            })
            .await?;

        tracing::info!(quiz_id = %saved.id, questions = saved.questions.len(), "Quiz saved");
        Ok(saved)
    }

    /// Removes the quiz. Scores referencing it are kept as orphaned history.
    /// Unknown ids are ignored.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.records.simulate_latency().await;
        let removed = self
            .records
            .update(Bucket::Quizzes, |quizzes: &mut Vec<Quiz>| {
                let before = quizzes.len();
                quizzes.retain(|q| q.id != id);
                if quizzes.len() == before {
                    return Err(AppError::NotFound("Quiz not found".to_string()));
                }
                Ok(())
            })
            .await;

        match removed {
            Ok(()) => {
                tracing::info!(quiz_id = %id, "Quiz deleted");
                Ok(())
            }
            Err(AppError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

fn question(id: &str, text: &str, options: [&str; 4], correct: &str) -> Question {
    Question {
        id: id.to_string(),
        text: text.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct_answer: correct.to_string(),
    }
}

/// Illustrative content for a fresh install.
fn sample_quizzes() -> Vec<Quiz> {
    vec![
        Quiz {
            id: "sample-rust-ownership".to_string(),
            title: "Rust Ownership Basics".to_string(),
            description: "Moves, borrows and lifetimes in everyday Rust.".to_string(),
            time_limit_secs: 300,
            questions: vec![
                question(
                    "sample-rust-1",
                    "What happens to a String when it is passed by value to a function?",
                    ["It is copied", "Ownership moves into the function", "It becomes 'static", "It is borrowed mutably"],
                    "Ownership moves into the function",
                ),
                question(
                    "sample-rust-2",
                    "How many mutable references to a value may exist at the same time?",
                    ["Any number", "Two", "One", "None"],
                    "One",
                ),
                question(
                    "sample-rust-3",
                    "Which trait lets a type be duplicated implicitly on assignment?",
                    ["Clone", "Copy", "Default", "Send"],
                    "Copy",
                ),
                question(
                    "sample-rust-4",
                    "When is a value dropped?",
                    ["When its owner goes out of scope", "At program exit only", "When the garbage collector runs", "Never"],
                    "When its owner goes out of scope",
                ),
            ],
        },
        Quiz {
            id: "sample-networking".to_string(),
            title: "Networking Fundamentals".to_string(),
            description: "Protocols and ports every developer meets.".to_string(),
            time_limit_secs: 480,
            questions: vec![
                question(
                    "sample-net-1",
                    "Which protocol guarantees ordered delivery of a byte stream?",
                    ["UDP", "TCP", "ICMP", "ARP"],
                    "TCP",
                ),
                question(
                    "sample-net-2",
                    "What is the default port for HTTPS?",
                    ["80", "8080", "443", "22"],
                    "443",
                ),
                question(
                    "sample-net-3",
                    "What does DNS primarily translate?",
                    ["Names to addresses", "Addresses to MAC addresses", "Ports to services", "Packets to frames"],
                    "Names to addresses",
                ),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::MemoryStore;

    fn collection() -> QuizCollection {
        QuizCollection::new(Records::new(Arc::new(MemoryStore::new())))
    }

    #[test]
    fn sample_answers_are_among_options() {
        for quiz in sample_quizzes() {
            for q in &quiz.questions {
                assert!(q.options.contains(&q.correct_answer), "{}", q.id);
            }
        }
    }

    #[tokio::test]
    async fn test_initialize_only_seeds_empty_collection() {
        let quizzes = collection();
        assert!(quizzes.initialize().await.unwrap());
        assert!(!quizzes.initialize().await.unwrap());
        assert_eq!(quizzes.list().await.len(), 2);
    }

    #[tokio::test]
    async fn test_save_updates_in_place_or_appends() {
        let quizzes = collection();
        let created = quizzes
            .save(SaveQuiz {
                id: None,
                title: "Draft".to_string(),
                description: String::new(),
                time_limit_secs: 60,
                questions: vec![question("qa", "?", ["a", "b", "c", "d"], "a")],
            })
            .await
            .unwrap();
        assert!(!created.id.is_empty());

        let mut edit = SaveQuiz::from(created.clone());
        edit.title = "Final".to_string();
        let updated = quizzes.save(edit).await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.questions[0].id, "qa");

        let stale = SaveQuiz {
            id: Some("gone".to_string()),
            ..SaveQuiz::from(created)
        };
        let appended = quizzes.save(stale).await.unwrap();
        assert_ne!(appended.id, "gone");

        let all = quizzes.list().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "Final");
    }

    #[tokio::test]
    async fn test_delete_unknown_is_noop() {
        let quizzes = collection();
        quizzes.initialize().await.unwrap();
        quizzes.delete("missing").await.unwrap();
        assert_eq!(quizzes.list().await.len(), 2);

        quizzes.delete("sample-networking").await.unwrap();
        assert!(quizzes.get_by_id("sample-networking").await.is_none());
    }
}
