// src/services/stats.rs

//! Read-only aggregates over accounts, quizzes and scores for the admin views.

use std::collections::{BTreeMap, HashSet};

use crate::models::{
    question::Quiz,
    score::{ReviewItem, Score, UserStats},
    user::{Account, Role},
};

/// Activity summary for every `user`-role account, in account order.
pub fn user_stats(accounts: &[Account], scores: &[Score]) -> Vec<UserStats> {
    accounts
        .iter()
        .filter(|a| a.role == Role::User)
        .map(|account| {
            let owned: Vec<&Score> = scores.iter().filter(|s| s.user_id == account.id).collect();
            let quizzes: HashSet<&str> = owned.iter().map(|s| s.quiz_id.as_str()).collect();
            UserStats {
                user_id: account.id.clone(),
                email: account.email.clone(),
                quizzes_taken: quizzes.len(),
                last_active: owned.iter().map(|s| s.date).max(),
            }
        })
        .collect()
}

/// Attempt count per quiz id. Ids of deleted quizzes are included.
pub fn quiz_attempts(scores: &[Score]) -> BTreeMap<String, usize> {
    let mut attempts = BTreeMap::new();
    for score in scores {
        *attempts.entry(score.quiz_id.clone()).or_insert(0) += 1;
    }
    attempts
}

/// Pairs each question of the quiz (as it is now) with the answer stored on the score.
///
/// Returns `None` when the score predates answer capture.
pub fn review_attempt(score: &Score, quiz: &Quiz) -> Option<Vec<ReviewItem>> {
    let answers = score.answers.as_ref()?;
    Some(
        quiz.questions
            .iter()
            .map(|q| {
                let user_answer = answers.get(&q.id).cloned();
                ReviewItem {
                    question_id: q.id.clone(),
                    question: q.text.clone(),
                    is_correct: user_answer.as_deref() == Some(q.correct_answer.as_str()),
                    user_answer,
                    correct_answer: q.correct_answer.clone(),
                }
            })
            .collect(),
    )
}
