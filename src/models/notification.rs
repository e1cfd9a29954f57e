// src/models/notification.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Entry of the global account/role audit feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

/// Signal sent to subscribers after the feed changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationEvent {
    Updated { unread: usize },
}
