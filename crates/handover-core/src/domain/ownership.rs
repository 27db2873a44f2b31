//! Task ownership record: who owns a task, and who is currently acting on it.

use serde::{Deserialize, Serialize};

use super::errors::HandoverError;
use super::ids::{TaskId, WorkerId};

/// One row of the ownership table.
///
/// - `original_owner_id` is fixed when the task is assigned.
/// - `acting_owner_id` equals `original_owner_id` unless a reallocation is in effect.
///
/// Only the reallocation and return engines mutate `acting_owner_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOwnership {
    pub task_id: TaskId,
    pub original_owner_id: WorkerId,
    pub acting_owner_id: WorkerId,
}

impl TaskOwnership {
    /// A freshly assigned task: acting owner is the original owner.
    pub fn assigned(task_id: TaskId, owner: WorkerId) -> Self {
        Self {
            task_id,
            original_owner_id: owner,
            acting_owner_id: owner,
        }
    }

    pub fn is_reallocated(&self) -> bool {
        self.acting_owner_id != self.original_owner_id
    }

    /// Hand the task to `substitute`.
    pub fn reassign_to(&mut self, substitute: WorkerId) {
        self.acting_owner_id = substitute;
    }

    /// Give the task back to its original owner.
    pub fn restore(&mut self) {
        self.acting_owner_id = self.original_owner_id;
    }
}

/// Untyped row as it comes out of (or goes into) a backing store.
///
/// Identifiers are signed integers, the way the SQL columns hold them.
/// `TaskOwnership::try_from` is the validation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipRow {
    pub task_id: i64,
    pub original_owner_id: i64,
    pub acting_owner_id: i64,
}

fn positive_id(column: &str, value: i64) -> Result<u64, HandoverError> {
    if value <= 0 {
        return Err(HandoverError::InvalidRecord(format!(
            "{column} must be a positive identifier, got {value}"
        )));
    }
    Ok(value as u64)
}

impl TryFrom<OwnershipRow> for TaskOwnership {
    type Error = HandoverError;

    fn try_from(row: OwnershipRow) -> Result<Self, Self::Error> {
        Ok(Self {
            task_id: TaskId::new(positive_id("task_id", row.task_id)?),
            original_owner_id: WorkerId::new(positive_id(
                "original_owner_id",
                row.original_owner_id,
            )?),
            acting_owner_id: WorkerId::new(positive_id("acting_owner_id", row.acting_owner_id)?),
        })
    }
}

fn stored_id(column: &str, value: u64) -> Result<i64, HandoverError> {
    match i64::try_from(value) {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(HandoverError::InvalidRecord(format!(
            "{column} {value} does not fit a store column"
        ))),
    }
}

impl TryFrom<TaskOwnership> for OwnershipRow {
    type Error = HandoverError;

    fn try_from(record: TaskOwnership) -> Result<Self, Self::Error> {
        Ok(Self {
            task_id: stored_id("task_id", record.task_id.value())?,
            original_owner_id: stored_id("original_owner_id", record.original_owner_id.value())?,
            acting_owner_id: stored_id("acting_owner_id", record.acting_owner_id.value())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn assigned_task_is_not_reallocated() {
        let t = TaskOwnership::assigned(TaskId::new(1), WorkerId::new(7));
        assert!(!t.is_reallocated());
        assert_eq!(t.acting_owner_id, WorkerId::new(7));
    }

    #[test]
    fn reassign_then_restore() {
        let mut t = TaskOwnership::assigned(TaskId::new(1), WorkerId::new(7));

        t.reassign_to(WorkerId::new(9));
        assert!(t.is_reallocated());
        assert_eq!(t.acting_owner_id, WorkerId::new(9));

        t.restore();
        assert!(!t.is_reallocated());
        assert_eq!(t.acting_owner_id, WorkerId::new(7));
    }

    #[test]
    fn valid_row_converts() {
        let row = OwnershipRow {
            task_id: 2,
            original_owner_id: 7,
            acting_owner_id: 9,
        };
        let t = TaskOwnership::try_from(row).unwrap();
        assert_eq!(t.task_id, TaskId::new(2));
        assert!(t.is_reallocated());
        assert_eq!(OwnershipRow::try_from(t).unwrap(), row);
    }

    #[rstest]
    #[case::zero_task(0, 7, 7)]
    #[case::negative_original(1, -3, 7)]
    #[case::zero_acting(1, 7, 0)]
    fn invalid_row_is_rejected(#[case] task: i64, #[case] original: i64, #[case] acting: i64) {
        let row = OwnershipRow {
            task_id: task,
            original_owner_id: original,
            acting_owner_id: acting,
        };
        let err = TaskOwnership::try_from(row).unwrap_err();
        assert!(matches!(err, HandoverError::InvalidRecord(_)));
    }

    #[rstest]
    #[case::zero(0)]
    #[case::above_signed_range(i64::MAX as u64 + 1)]
    #[case::max(u64::MAX)]
    fn unstorable_id_does_not_wrap(#[case] acting: u64) {
        let record = TaskOwnership {
            task_id: TaskId::new(2),
            original_owner_id: WorkerId::new(7),
            acting_owner_id: WorkerId::new(acting),
        };

        let err = OwnershipRow::try_from(record).unwrap_err();

        assert!(matches!(err, HandoverError::InvalidRecord(_)));
    }

    #[test]
    fn largest_storable_id_round_trips() {
        let record = TaskOwnership::assigned(TaskId::new(1), WorkerId::new(i64::MAX as u64));

        let row = OwnershipRow::try_from(record).unwrap();

        assert_eq!(row.acting_owner_id, i64::MAX);
        assert_eq!(TaskOwnership::try_from(row).unwrap(), record);
    }
}
