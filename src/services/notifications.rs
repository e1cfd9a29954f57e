// src/services/notifications.rs

use chrono::Utc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    config::NOTIFICATION_RETENTION,
    error::AppError,
    models::notification::{Notification, NotificationEvent},
    store::{Bucket, Records},
};

/// Global audit feed of account and role events, newest first, capped at
/// `NOTIFICATION_RETENTION` entries.
#[derive(Clone)]
pub struct NotificationLog {
    records: Records,
    events: broadcast::Sender<NotificationEvent>,
}

impl NotificationLog {
    pub fn new(records: Records) -> Self {
        let (events, _) = broadcast::channel(32);
        Self { records, events }
    }

    /// Receives `NotificationEvent::Updated` after every append and mark-all-read.
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.events.subscribe()
    }

    /// Prepends a new unread entry and evicts the oldest beyond the cap.
    pub async fn append(&self, message: impl Into<String>) -> Result<Notification, AppError> {
        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            message: message.into(),
            timestamp: Utc::now(),
            read: false,
        };

        let entry = notification.clone();
        let unread = self
            .records
            .update(Bucket::Notifications, move |feed: &mut Vec<Notification>| {
                feed.insert(0, entry);
                feed.truncate(NOTIFICATION_RETENTION);
                Ok(unread_in(feed))
            })
            .await?;

        self.events.send(NotificationEvent::Updated { unread }).ok();
        Ok(notification)
    }

    /// Newest first.
    pub async fn list_all(&self) -> Vec<Notification> {
        self.records.read_all(Bucket::Notifications).await
    }

    pub async fn unread_count(&self) -> usize {
        unread_in(&self.list_all().await)
    }

    pub async fn mark_all_read(&self) -> Result<Vec<Notification>, AppError> {
        let feed = self
            .records
            .update(Bucket::Notifications, |feed: &mut Vec<Notification>| {
                for n in feed.iter_mut() {
                    n.read = true;
                }
                Ok(feed.clone())
            })
            .await?;

        self.events.send(NotificationEvent::Updated { unread: 0 }).ok();
        Ok(feed)
    }
}

fn unread_in(feed: &[Notification]) -> usize {
    feed.iter().filter(|n| !n.read).count()
}
