//! Outcome records: what the engines did to each task.
//!
//! Outcomes are write-once. They are returned to the caller and appended to
//! the outcome archive; nothing mutates them afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{EntryId, TaskId, WorkerId};

/// Reason recorded when the matcher has nobody for a task.
pub const NO_QUALIFIED_SUBSTITUTE: &str = "no qualified substitute";

/// Result of processing one task during a reallocation.
///
/// `reason` is present iff `reallocated` is false; use the constructors to
/// keep that true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReallocationOutcome {
    pub task_id: TaskId,
    pub original_owner_id: WorkerId,
    pub absent_worker_id: WorkerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substitute_id: Option<WorkerId>,
    pub reallocated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub executed_at: DateTime<Utc>,
}

impl ReallocationOutcome {
    pub fn reallocated(
        task_id: TaskId,
        original_owner_id: WorkerId,
        absent_worker_id: WorkerId,
        substitute_id: WorkerId,
        executed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id,
            original_owner_id,
            absent_worker_id,
            substitute_id: Some(substitute_id),
            reallocated: true,
            reason: None,
            executed_at,
        }
    }

    pub fn not_reallocated(
        task_id: TaskId,
        original_owner_id: WorkerId,
        absent_worker_id: WorkerId,
        reason: impl Into<String>,
        executed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id,
            original_owner_id,
            absent_worker_id,
            substitute_id: None,
            reallocated: false,
            reason: Some(reason.into()),
            executed_at,
        }
    }
}

/// Result of handing one task back to its original owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnOutcome {
    pub task_id: TaskId,
    pub original_owner_id: WorkerId,
    pub previous_acting_owner_id: WorkerId,
    pub returning_worker_id: WorkerId,
    pub executed_at: DateTime<Utc>,
}

/// Either kind of outcome, as stored in the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeRecord {
    Reallocation(ReallocationOutcome),
    Return(ReturnOutcome),
}

impl OutcomeRecord {
    pub fn task_id(&self) -> TaskId {
        match self {
            OutcomeRecord::Reallocation(o) => o.task_id,
            OutcomeRecord::Return(o) => o.task_id,
        }
    }
}

impl From<ReallocationOutcome> for OutcomeRecord {
    fn from(outcome: ReallocationOutcome) -> Self {
        OutcomeRecord::Reallocation(outcome)
    }
}

impl From<ReturnOutcome> for OutcomeRecord {
    fn from(outcome: ReturnOutcome) -> Self {
        OutcomeRecord::Return(outcome)
    }
}

/// An archived outcome.
///
/// Archives are not idempotent: recording the same outcome twice yields two
/// entries with different `entry_id`s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub entry_id: EntryId,
    pub recorded_at: DateTime<Utc>,
    pub record: OutcomeRecord,
}
