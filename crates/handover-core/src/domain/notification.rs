//! Notifications sent to workers after an ownership change.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{TaskId, WorkerId};

/// Default retention for stored notifications.
pub const NOTIFICATION_TTL_DAYS: i64 = 7;

pub fn default_notification_ttl() -> Duration {
    Duration::days(NOTIFICATION_TTL_DAYS)
}

/// `(recipient, sequence)` key. Sequences are per recipient and start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NotificationKey {
    pub recipient_id: WorkerId,
    pub sequence: u64,
}

impl fmt::Display for NotificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "worker:{}:notification:{}",
            self.recipient_id.value(),
            self.sequence
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub key: NotificationKey,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Notification {
    pub fn recipient_id(&self) -> WorkerId {
        self.key.recipient_id
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

// Message texts.

pub fn reallocated_message(task: TaskId) -> String {
    format!("Task {} has been temporarily reallocated to you.", task.value())
}

pub fn not_reallocated_message(task: TaskId) -> String {
    format!(
        "Task {} could not be reallocated: no qualified substitute found.",
        task.value()
    )
}

pub fn returned_message(task: TaskId) -> String {
    format!("Task {} has been returned to you.", task.value())
}
