//! Absence calendar entries (read-only to the core).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::WorkerId;

/// One calendar entry: whether `worker_id` is present on `date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsenceRecord {
    pub worker_id: WorkerId,
    pub date: NaiveDate,
    pub present: bool,
}

impl AbsenceRecord {
    pub fn absent(worker_id: WorkerId, date: NaiveDate) -> Self {
        Self {
            worker_id,
            date,
            present: false,
        }
    }

    pub fn present(worker_id: WorkerId, date: NaiveDate) -> Self {
        Self {
            worker_id,
            date,
            present: true,
        }
    }

    pub fn is_absence(&self) -> bool {
        !self.present
    }
}

/// Distinct workers marked absent in `records`, in first-seen order.
pub fn distinct_absent_workers<'a>(
    records: impl IntoIterator<Item = &'a AbsenceRecord>,
) -> Vec<WorkerId> {
    let mut seen = std::collections::HashSet::new();
    records
        .into_iter()
        .filter(|r| r.is_absence())
        .map(|r| r.worker_id)
        .filter(|w| seen.insert(*w))
        .collect()
}
