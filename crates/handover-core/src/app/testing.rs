//! Shared wiring for app-layer tests.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use super::effects::{Deliverer, EffectDispatcher, InlineDispatcher};
use super::reallocation::ReallocationEngine;
use super::return_engine::ReturnEngine;
use crate::domain::{TaskId, TaskOwnership, WorkerId};
use crate::impls::{
    InMemoryAbsenceCalendar, InMemoryNotificationSink, InMemoryOutcomeArchive,
    InMemoryOwnershipStore, RecordingEventSink, StaticSubstituteMatcher,
};
use crate::ports::{FixedClock, UlidGenerator};

pub fn t(n: u64) -> TaskId {
    TaskId::new(n)
}

pub fn w(n: u64) -> WorkerId {
    WorkerId::new(n)
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

pub fn morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 6, 0, 0).unwrap()
}

pub struct Harness {
    pub clock: Arc<FixedClock>,
    pub store: Arc<InMemoryOwnershipStore>,
    pub matcher: Arc<StaticSubstituteMatcher>,
    pub calendar: Arc<InMemoryAbsenceCalendar>,
    pub notifications: Arc<InMemoryNotificationSink>,
    pub archive: Arc<InMemoryOutcomeArchive>,
    pub events: Arc<RecordingEventSink>,
}

impl Harness {
    pub fn new(records: impl IntoIterator<Item = TaskOwnership>) -> Self {
        let clock = Arc::new(FixedClock::new(morning()));
        Self {
            store: Arc::new(InMemoryOwnershipStore::from_records(records)),
            matcher: Arc::new(StaticSubstituteMatcher::new()),
            calendar: Arc::new(InMemoryAbsenceCalendar::default()),
            notifications: Arc::new(InMemoryNotificationSink::new(clock.clone())),
            archive: Arc::new(InMemoryOutcomeArchive::new(
                clock.clone(),
                Arc::new(UlidGenerator::new(clock.clone())),
            )),
            events: Arc::new(RecordingEventSink::new()),
            clock,
        }
    }

    /// T1 and T2, both owned and acted on by worker 7.
    pub fn worker_seven() -> Self {
        Self::new([
            TaskOwnership::assigned(t(1), w(7)),
            TaskOwnership::assigned(t(2), w(7)),
        ])
    }

    pub fn deliverer(&self) -> Arc<Deliverer> {
        Arc::new(Deliverer::new(
            self.notifications.clone(),
            self.archive.clone(),
            self.events.clone(),
        ))
    }

    pub fn dispatcher(&self) -> Arc<dyn EffectDispatcher> {
        Arc::new(InlineDispatcher::new(self.deliverer()))
    }

    pub fn reallocation_engine(&self) -> ReallocationEngine {
        ReallocationEngine::new(
            self.store.clone(),
            self.matcher.clone(),
            self.clock.clone(),
            self.dispatcher(),
        )
    }

    pub fn return_engine(&self) -> ReturnEngine {
        ReturnEngine::new(self.store.clone(), self.clock.clone(), self.dispatcher())
    }

    pub async fn messages_for(&self, worker: WorkerId) -> Vec<String> {
        self.notifications
            .inbox(worker)
            .await
            .into_iter()
            .map(|n| n.message)
            .collect()
    }
}
