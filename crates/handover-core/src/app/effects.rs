//! Post-commit side effects.
//!
//! Engines never call the notification sink or the archive while a
//! transaction is open. They commit first, then hand a list of
//! `SideEffect`s to an `EffectDispatcher`:
//!
//! - `InlineDispatcher` delivers them right away on the calling task.
//! - `QueuedDispatcher` (see `delivery_loop`) pushes them to a background loop.
//!
//! Each effect gets exactly one delivery attempt. Failures are logged and
//! swallowed: the ownership change has already been committed and must not
//! be undone because a notification could not be stored.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::{DomainEvent, OutcomeRecord, WorkerId};
use crate::ports::{EventSink, NotificationSink, OutcomeArchive};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    Notify { recipient: WorkerId, message: String },
    Archive(Vec<OutcomeRecord>),
    Event(DomainEvent),
}

impl SideEffect {
    pub fn notify(recipient: WorkerId, message: impl Into<String>) -> Self {
        SideEffect::Notify {
            recipient,
            message: message.into(),
        }
    }
}

/// Counts from one delivery pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub delivered: usize,
    pub failed: usize,
}

#[async_trait]
pub trait EffectDispatcher: Send + Sync {
    /// Never fails: delivery problems are logged by the dispatcher.
    async fn dispatch(&self, effects: Vec<SideEffect>);
}

/// Performs side effects against the configured sinks.
pub struct Deliverer {
    notifications: Arc<dyn NotificationSink>,
    archive: Arc<dyn OutcomeArchive>,
    events: Arc<dyn EventSink>,
}

impl Deliverer {
    pub fn new(
        notifications: Arc<dyn NotificationSink>,
        archive: Arc<dyn OutcomeArchive>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            notifications,
            archive,
            events,
        }
    }

    pub async fn deliver_all(&self, effects: Vec<SideEffect>) -> DeliveryStats {
        let mut stats = DeliveryStats::default();
        for effect in effects {
            if self.deliver(effect).await {
                stats.delivered += 1;
            } else {
                stats.failed += 1;
            }
        }
        stats
    }

    async fn deliver(&self, effect: SideEffect) -> bool {
        match effect {
            SideEffect::Notify { recipient, message } => {
                match self.notifications.notify(recipient, &message).await {
                    Ok(key) => {
                        debug!(key = %key, "notification recorded");
                        true
                    }
                    Err(e) => {
                        warn!(worker = %recipient, error = %e, "failed to record notification");
                        false
                    }
                }
            }
            SideEffect::Archive(records) => {
                if records.is_empty() {
                    return true;
                }
                match self.archive.record(&records).await {
                    Ok(written) => {
                        debug!(written, "outcomes archived");
                        true
                    }
                    Err(e) => {
                        warn!(outcomes = records.len(), error = %e, "failed to archive outcomes");
                        false
                    }
                }
            }
            SideEffect::Event(event) => {
                self.events.emit(event).await;
                true
            }
        }
    }
}

pub struct InlineDispatcher {
    deliverer: Arc<Deliverer>,
}

impl InlineDispatcher {
    pub fn new(deliverer: Arc<Deliverer>) -> Self {
        Self { deliverer }
    }
}

#[async_trait]
impl EffectDispatcher for InlineDispatcher {
    async fn dispatch(&self, effects: Vec<SideEffect>) {
        let stats = self.deliverer.deliver_all(effects).await;
        if stats.failed > 0 {
            warn!(
                delivered = stats.delivered,
                failed = stats.failed,
                "some post-commit effects were not delivered"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ReturnOutcome, TaskId};
    use crate::impls::{InMemoryNotificationSink, InMemoryOutcomeArchive, RecordingEventSink};
    use crate::ports::{SystemClock, UlidGenerator};

    struct Sinks {
        notifications: Arc<InMemoryNotificationSink>,
        archive: Arc<InMemoryOutcomeArchive>,
        events: Arc<RecordingEventSink>,
    }

    fn sinks() -> Sinks {
        Sinks {
            notifications: Arc::new(InMemoryNotificationSink::new(Arc::new(SystemClock))),
            archive: Arc::new(InMemoryOutcomeArchive::new(
                Arc::new(SystemClock),
                Arc::new(UlidGenerator::new(SystemClock)),
            )),
            events: Arc::new(RecordingEventSink::new()),
        }
    }

    fn deliverer(s: &Sinks) -> Deliverer {
        Deliverer::new(s.notifications.clone(), s.archive.clone(), s.events.clone())
    }

    fn returned() -> OutcomeRecord {
        OutcomeRecord::from(ReturnOutcome {
            task_id: TaskId::new(2),
            original_owner_id: WorkerId::new(7),
            previous_acting_owner_id: WorkerId::new(9),
            returning_worker_id: WorkerId::new(7),
            executed_at: chrono::Utc::now(),
        })
    }

    #[tokio::test]
    async fn delivers_every_kind_of_effect() {
        let s = sinks();
        let stats = deliverer(&s)
            .deliver_all(vec![
                SideEffect::notify(WorkerId::new(7), "hi"),
                SideEffect::Archive(vec![returned()]),
                SideEffect::Event(DomainEvent::TasksReturned {
                    returning_worker_id: WorkerId::new(7),
                    returned: 1,
                }),
            ])
            .await;

        assert_eq!(stats, DeliveryStats { delivered: 3, failed: 0 });
        assert_eq!(s.notifications.inbox(WorkerId::new(7)).await.len(), 1);
        assert_eq!(s.archive.len().await, 1);
        assert_eq!(s.events.events().await.len(), 1);
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_rest() {
        let s = sinks();
        s.notifications.set_failing(true);

        let stats = deliverer(&s)
            .deliver_all(vec![
                SideEffect::notify(WorkerId::new(7), "lost"),
                SideEffect::Archive(vec![returned()]),
            ])
            .await;

        assert_eq!(stats, DeliveryStats { delivered: 1, failed: 1 });
        assert_eq!(s.archive.len().await, 1);
    }

    #[tokio::test]
    async fn inline_dispatcher_swallows_failures() {
        let s = sinks();
        s.archive.set_failing(true);
        let dispatcher = InlineDispatcher::new(Arc::new(deliverer(&s)));

        dispatcher
            .dispatch(vec![SideEffect::Archive(vec![returned()])])
            .await;

        assert!(s.archive.is_empty().await);
    }
}
