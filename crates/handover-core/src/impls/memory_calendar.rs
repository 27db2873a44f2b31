//! InMemoryAbsenceCalendar - 出欠カレンダーのメモリ実装

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{AbsenceRecord, HandoverError};
use crate::ports::AbsenceCalendar;

#[derive(Default)]
pub struct InMemoryAbsenceCalendar {
    records: RwLock<Vec<AbsenceRecord>>,
    unavailable: AtomicBool,
}

impl InMemoryAbsenceCalendar {
    pub fn new(records: impl IntoIterator<Item = AbsenceRecord>) -> Self {
        Self {
            records: RwLock::new(records.into_iter().collect()),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn add(&self, record: AbsenceRecord) {
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(record);
    }

    /// Make every lookup fail with a connection error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl AbsenceCalendar for InMemoryAbsenceCalendar {
    async fn absences_on(&self, date: NaiveDate) -> Result<Vec<AbsenceRecord>, HandoverError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(HandoverError::Connection(
                "absence calendar unavailable".to_string(),
            ));
        }
        Ok(self
            .records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|r| r.date == date)
            .copied()
            .collect())
    }
}
