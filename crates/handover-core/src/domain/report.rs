//! Sweep report: aggregated result of one scheduled run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::WorkerId;

/// A worker whose engine call failed during a sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerFailure {
    pub worker_id: WorkerId,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub date: NaiveDate,

    /// Distinct workers the engine was invoked for.
    pub processed_count: usize,

    /// Outcomes produced across all successful workers.
    pub total_outcomes: usize,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_workers: Vec<WorkerFailure>,
}

impl SweepReport {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            processed_count: 0,
            total_outcomes: 0,
            failed_workers: Vec::new(),
        }
    }

    pub fn record_success(&mut self, outcomes: usize) {
        self.processed_count += 1;
        self.total_outcomes += outcomes;
    }

    pub fn record_failure(&mut self, worker_id: WorkerId, error: impl ToString) {
        self.processed_count += 1;
        self.failed_workers.push(WorkerFailure {
            worker_id,
            error: error.to_string(),
        });
    }

    pub fn is_clean(&self) -> bool {
        self.failed_workers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_accumulates() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let mut report = SweepReport::empty(date);

        report.record_success(2);
        report.record_success(0);
        report.record_failure(WorkerId::new(3), "store unreachable");

        assert_eq!(report.processed_count, 3);
        assert_eq!(report.total_outcomes, 2);
        assert!(!report.is_clean());
        assert_eq!(report.failed_workers[0].worker_id, WorkerId::new(3));
    }
}
