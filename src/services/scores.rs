// src/services/scores.rs

use crate::{
    error::AppError,
    models::score::Score,
    store::{Bucket, Records},
};

/// Append-only log of quiz attempts.
///
/// The only in-place maintenance is email propagation and per-user deletion,
/// both driven by the account collection.
#[derive(Clone)]
pub struct ScoreCollection {
    records: Records,
}

impl ScoreCollection {
    pub fn new(records: Records) -> Self {
        Self { records }
    }

    pub async fn append(&self, score: Score) -> Result<(), AppError> {
        self.records.simulate_latency().await;
        self.records
            .update(Bucket::Scores, move |scores: &mut Vec<Score>| {
                scores.push(score);
                Ok(())
            })
            .await
    }

    /// Insertion order.
    pub async fn all(&self) -> Vec<Score> {
        self.records.simulate_latency().await;
        self.records.read_all(Bucket::Scores).await
    }

    /// A user's attempts, most recent first.
    pub async fn all_for_user(&self, user_id: &str) -> Vec<Score> {
        let mut scores: Vec<Score> = self
            .all()
            .await
            .into_iter()
            .filter(|s| s.user_id == user_id)
            .collect();
        scores.sort_by(|a, b| b.date.cmp(&a.date));
        scores
    }

    /// All attempts ranked by score, highest first. Equal scores rank the earlier attempt first.
    pub async fn leaderboard(&self) -> Vec<Score> {
        let mut scores = self.all().await;
        rank(&mut scores);
        scores
    }

    pub async fn leaderboard_top(&self, limit: usize) -> Vec<Score> {
        let mut scores = self.leaderboard().await;
        scores.truncate(limit);
        scores
    }

    /// Rewrites the email snapshot on every score owned by `user_id`.
    /// Returns how many records changed.
    pub async fn propagate_email(&self, user_id: &str, new_email: &str) -> Result<usize, AppError> {
        self.records
            .update(Bucket::Scores, |scores: &mut Vec<Score>| {
                let mut changed = 0;
                for score in scores.iter_mut().filter(|s| s.user_id == user_id) {
                    score.user_email = new_email.to_string();
                    changed += 1;
                }
                Ok(changed)
            })
            .await
    }

    /// Deletes every score owned by `user_id`. Returns how many were removed.
    pub async fn remove_all_for_user(&self, user_id: &str) -> Result<usize, AppError> {
        self.records
            .update(Bucket::Scores, |scores: &mut Vec<Score>| {
                let before = scores.len();
                scores.retain(|s| s.user_id != user_id);
                Ok(before - scores.len())
            })
            .await
    }
}

pub(crate) fn rank(scores: &mut [Score]) {
    scores.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.date.cmp(&b.date)));
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::store::MemoryStore;

    fn score(id: &str, user: &str, points: u32, minutes: i64) -> Score {
        Score {
            id: id.to_string(),
            quiz_id: "q1".to_string(),
            quiz_title: "Quiz".to_string(),
            user_id: user.to_string(),
            user_email: format!("{}@example.com", user),
            score: points,
            total_questions: 4,
            date: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes),
            answers: None,
        }
    }

    fn collection() -> ScoreCollection {
        ScoreCollection::new(Records::new(Arc::new(MemoryStore::new())))
    }

    #[tokio::test]
    async fn test_leaderboard_tie_prefers_earlier_date() {
        let scores = collection();
        scores.append(score("later", "a", 90, 10)).await.unwrap();
        scores.append(score("earlier", "b", 90, 0)).await.unwrap();
        scores.append(score("low", "c", 40, -5)).await.unwrap();
        scores.append(score("high", "d", 95, 30)).await.unwrap();

        let ids: Vec<String> = scores.leaderboard().await.into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["high", "earlier", "later", "low"]);

        let top: Vec<String> = scores.leaderboard_top(2).await.into_iter().map(|s| s.id).collect();
        assert_eq!(top, vec!["high", "earlier"]);
    }

    #[tokio::test]
    async fn test_all_for_user_newest_first() {
        let scores = collection();
        scores.append(score("s1", "a", 1, 0)).await.unwrap();
        scores.append(score("s2", "b", 1, 5)).await.unwrap();
        scores.append(score("s3", "a", 1, 20)).await.unwrap();

        let ids: Vec<String> = scores.all_for_user("a").await.into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["s3", "s1"]);
    }

    #[tokio::test]
    async fn test_propagate_and_remove_touch_only_owner() {
        let scores = collection();
        scores.append(score("s1", "a", 1, 0)).await.unwrap();
        scores.append(score("s2", "b", 1, 0)).await.unwrap();
        scores.append(score("s3", "a", 1, 0)).await.unwrap();

        assert_eq!(scores.propagate_email("a", "new@example.com").await.unwrap(), 2);
        let all = scores.all().await;
        assert_eq!(all[0].user_email, "new@example.com");
        assert_eq!(all[1].user_email, "b@example.com");

        assert_eq!(scores.remove_all_for_user("a").await.unwrap(), 2);
        let remaining: Vec<String> = scores.all().await.into_iter().map(|s| s.id).collect();
        assert_eq!(remaining, vec!["s2"]);
    }
}
