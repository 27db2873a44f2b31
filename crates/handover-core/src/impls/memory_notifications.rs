//! InMemoryNotificationSink - TTL 付きの通知ストア（メモリ実装）
//!
//! キー設計は KV ストアと同じ形にしています:
//! - `worker:{id}:notification:id` に相当する受信者ごとのカウンタ
//! - `worker:{id}:notification:{seq}` に本文・作成時刻・期限

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::notification::default_notification_ttl;
use crate::domain::{HandoverError, Notification, NotificationKey, WorkerId};
use crate::ports::{Clock, NotificationSink};

#[derive(Default)]
struct Inbox {
    counters: HashMap<WorkerId, u64>,
    items: BTreeMap<NotificationKey, Notification>,
}

pub struct InMemoryNotificationSink {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    inbox: Mutex<Inbox>,
    failing: AtomicBool,
}

impl InMemoryNotificationSink {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(clock, default_notification_ttl())
    }

    pub fn with_ttl(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            clock,
            ttl,
            inbox: Mutex::new(Inbox::default()),
            failing: AtomicBool::new(false),
        }
    }

    /// Simulate a transport outage.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Unexpired notifications for `recipient`, oldest first.
    pub async fn inbox(&self, recipient: WorkerId) -> Vec<Notification> {
        let now = self.clock.now();
        self.inbox
            .lock()
            .await
            .items
            .values()
            .filter(|n| n.recipient_id() == recipient && !n.is_expired(now))
            .cloned()
            .collect()
    }

    /// Every stored notification, expired or not.
    pub async fn all(&self) -> Vec<Notification> {
        self.inbox.lock().await.items.values().cloned().collect()
    }

    /// Load previously stored notifications, e.g. from a saved fixture.
    ///
    /// Counters move past the highest loaded sequence per recipient.
    pub async fn restore(&self, notifications: impl IntoIterator<Item = Notification>) {
        let mut inbox = self.inbox.lock().await;
        for n in notifications {
            let counter = inbox.counters.entry(n.recipient_id()).or_insert(0);
            *counter = (*counter).max(n.key.sequence);
            inbox.items.insert(n.key, n);
        }
    }

    /// Drop expired notifications. Counters are kept so sequences never repeat.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut inbox = self.inbox.lock().await;
        let before = inbox.items.len();
        inbox.items.retain(|_, n| !n.is_expired(now));
        before - inbox.items.len()
    }
}

#[async_trait]
impl NotificationSink for InMemoryNotificationSink {
    async fn notify(
        &self,
        recipient: WorkerId,
        message: &str,
    ) -> Result<NotificationKey, HandoverError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(HandoverError::Sink(format!(
                "notification store unavailable for {recipient}"
            )));
        }

        let created_at = self.clock.now();
        let expires_at = created_at.checked_add_signed(self.ttl).ok_or_else(|| {
            HandoverError::Sink(format!(
                "notification for {recipient} would expire outside the representable range"
            ))
        })?;
        let mut inbox = self.inbox.lock().await;
        let counter = inbox.counters.entry(recipient).or_insert(0);
        *counter += 1;
        let key = NotificationKey {
            recipient_id: recipient,
            sequence: *counter,
        };
        inbox.items.insert(
            key,
            Notification {
                key,
                message: message.to_string(),
                created_at,
                expires_at,
            },
        );
        debug!(key = %key, "notification stored");
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FixedClock;
    use chrono::{TimeZone, Utc};

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap(),
        ))
    }

    #[tokio::test]
    async fn sequences_are_per_recipient() {
        let sink = InMemoryNotificationSink::new(clock());

        let a1 = sink.notify(WorkerId::new(9), "a").await.unwrap();
        let a2 = sink.notify(WorkerId::new(9), "b").await.unwrap();
        let b1 = sink.notify(WorkerId::new(7), "c").await.unwrap();

        assert_eq!(a1.sequence, 1);
        assert_eq!(a2.sequence, 2);
        assert_eq!(b1.sequence, 1);
        assert_eq!(sink.inbox(WorkerId::new(9)).await.len(), 2);
    }

    #[tokio::test]
    async fn notifications_expire_after_seven_days() {
        let clock = clock();
        let sink = InMemoryNotificationSink::new(clock.clone());
        sink.notify(WorkerId::new(9), "hello").await.unwrap();

        clock.advance(Duration::days(6));
        assert_eq!(sink.inbox(WorkerId::new(9)).await.len(), 1);
        assert_eq!(sink.purge_expired().await, 0);

        clock.advance(Duration::days(1));
        assert!(sink.inbox(WorkerId::new(9)).await.is_empty());
        assert_eq!(sink.purge_expired().await, 1);
        assert!(sink.all().await.is_empty());

        // カウンタは残るので番号は再利用されない
        let next = sink.notify(WorkerId::new(9), "again").await.unwrap();
        assert_eq!(next.sequence, 2);
    }

    #[tokio::test]
    async fn failing_sink_reports_sink_error() {
        let sink = InMemoryNotificationSink::new(clock());
        sink.set_failing(true);

        let err = sink.notify(WorkerId::new(9), "x").await.unwrap_err();
        assert!(matches!(err, HandoverError::Sink(_)));
        assert!(sink.all().await.is_empty());
    }

    #[tokio::test]
    async fn restored_notifications_keep_sequences_unique() {
        let sink = InMemoryNotificationSink::new(clock());
        let worker = WorkerId::new(7);
        let now = clock().now();
        sink.restore([Notification {
            key: NotificationKey {
                recipient_id: worker,
                sequence: 4,
            },
            message: "old".to_string(),
            created_at: now,
            expires_at: now + Duration::days(1),
        }])
        .await;

        let key = sink.notify(worker, "new").await.unwrap();

        assert_eq!(key.sequence, 5);
        assert_eq!(sink.inbox(worker).await.len(), 2);
    }

    #[tokio::test]
    async fn unrepresentable_expiry_is_a_sink_error() {
        let sink = InMemoryNotificationSink::with_ttl(clock(), Duration::MAX);

        let err = sink.notify(WorkerId::new(9), "x").await.unwrap_err();

        assert!(matches!(err, HandoverError::Sink(_)));
        assert!(sink.all().await.is_empty());
    }
}
