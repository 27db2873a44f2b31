//! InMemoryOutcomeArchive - 追記のみのレポート保存先

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ArchiveEntry, HandoverError, OutcomeRecord};
use crate::ports::{Clock, IdGenerator, OutcomeArchive};

pub struct InMemoryOutcomeArchive {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    entries: Mutex<Vec<ArchiveEntry>>,
    failing: AtomicBool,
}

impl InMemoryOutcomeArchive {
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            clock,
            ids,
            entries: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn entries(&self) -> Vec<ArchiveEntry> {
        self.entries.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl OutcomeArchive for InMemoryOutcomeArchive {
    async fn record(&self, outcomes: &[OutcomeRecord]) -> Result<usize, HandoverError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(HandoverError::Sink("outcome archive unavailable".to_string()));
        }

        let recorded_at = self.clock.now();
        let batch: Vec<ArchiveEntry> = outcomes
            .iter()
            .map(|record| ArchiveEntry {
                entry_id: self.ids.generate_entry_id(),
                recorded_at,
                record: record.clone(),
            })
            .collect();

        let written = batch.len();
        self.entries.lock().await.extend(batch);
        Ok(written)
    }
}
