//! Events - ドメインイベント
//!
//! コミット後に EventSink へ送られます。監査・メトリクス連携用で、
//! 所有権の正本はあくまで OwnershipStore です。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::WorkerId;

/// SweepKind はスケジュール実行の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepKind {
    Reallocation,
    Return,
}

/// DomainEvent はドメインで発生したイベント
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    /// An absent worker's task set was processed and committed.
    TasksReallocated {
        absent_worker_id: WorkerId,
        reallocated: usize,
        skipped: usize,
    },

    /// A returning worker got their tasks back.
    TasksReturned {
        returning_worker_id: WorkerId,
        returned: usize,
    },

    SweepCompleted {
        kind: SweepKind,
        date: NaiveDate,
        processed_count: usize,
        total_outcomes: usize,
        failed: usize,
    },
}
