//! InMemoryOwnershipStore - 開発・テスト用の所有権ストア
//!
//! # 実装詳細
//! - `tokio::sync::Mutex` の OwnedMutexGuard をトランザクションが保持（排他）
//! - 変更はコピー（staged）に対して行い、commit 時にだけ書き戻す
//! - commit せずに drop すればガードが解放され、変更は捨てられる（ロールバック）
//! - 障害注入: 到達不能、特定タスクの更新失敗

use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::domain::{HandoverError, OwnershipRow, TaskId, TaskOwnership, WorkerId};
use crate::ports::{OwnershipStore, OwnershipTransaction};

#[derive(Debug, Default)]
struct Faults {
    unreachable: bool,
    failing_updates: HashSet<TaskId>,
}

/// In-memory ownership table. Rows keep insertion order.
#[derive(Default)]
pub struct InMemoryOwnershipStore {
    rows: Arc<Mutex<Vec<TaskOwnership>>>,
    faults: Arc<StdMutex<Faults>>,
}

impl InMemoryOwnershipStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = TaskOwnership>) -> Self {
        Self {
            rows: Arc::new(Mutex::new(records.into_iter().collect())),
            faults: Arc::default(),
        }
    }

    /// Add a record. Task ids are unique and every id must fit a store column.
    pub async fn insert(&self, record: TaskOwnership) -> Result<(), HandoverError> {
        OwnershipRow::try_from(record)?;
        let mut rows = self.rows.lock().await;
        if rows.iter().any(|r| r.task_id == record.task_id) {
            return Err(HandoverError::InvalidRecord(format!(
                "{} already has an ownership record",
                record.task_id
            )));
        }
        rows.push(record);
        Ok(())
    }

    /// Add a raw row, validating it first.
    pub async fn insert_row(&self, row: OwnershipRow) -> Result<(), HandoverError> {
        self.insert(TaskOwnership::try_from(row)?).await
    }

    pub async fn snapshot(&self) -> Vec<TaskOwnership> {
        self.rows.lock().await.clone()
    }

    pub async fn get(&self, task: TaskId) -> Option<TaskOwnership> {
        self.rows
            .lock()
            .await
            .iter()
            .find(|r| r.task_id == task)
            .copied()
    }

    /// Make `begin` fail with a connection error.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.faults().unreachable = unreachable;
    }

    /// Make any update touching `task` fail inside a transaction.
    pub fn fail_updates_for(&self, task: TaskId) {
        self.faults().failing_updates.insert(task);
    }

    pub fn clear_faults(&self) {
        *self.faults() = Faults::default();
    }

    fn faults(&self) -> std::sync::MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl OwnershipStore for InMemoryOwnershipStore {
    async fn begin(&self) -> Result<Box<dyn OwnershipTransaction>, HandoverError> {
        let failing_updates = {
            let faults = self.faults();
            if faults.unreachable {
                return Err(HandoverError::Connection(
                    "in-memory store marked unreachable".to_string(),
                ));
            }
            faults.failing_updates.clone()
        };

        let guard = Arc::clone(&self.rows).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(InMemoryTransaction {
            guard,
            staged,
            failing_updates,
        }))
    }
}

struct InMemoryTransaction {
    guard: OwnedMutexGuard<Vec<TaskOwnership>>,
    staged: Vec<TaskOwnership>,
    failing_updates: HashSet<TaskId>,
}

impl InMemoryTransaction {
    fn check_writable(&self, task: TaskId) -> Result<(), HandoverError> {
        if self.failing_updates.contains(&task) {
            return Err(HandoverError::InvalidRecord(format!(
                "update rejected for {task}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl OwnershipTransaction for InMemoryTransaction {
    async fn tasks_acting_for(
        &mut self,
        worker: WorkerId,
    ) -> Result<Vec<TaskOwnership>, HandoverError> {
        Ok(self
            .staged
            .iter()
            .filter(|r| r.acting_owner_id == worker)
            .copied()
            .collect())
    }

    async fn reallocated_from(
        &mut self,
        worker: WorkerId,
    ) -> Result<Vec<TaskOwnership>, HandoverError> {
        Ok(self
            .staged
            .iter()
            .filter(|r| r.original_owner_id == worker && r.is_reallocated())
            .copied()
            .collect())
    }

    async fn set_acting_owner(
        &mut self,
        task: TaskId,
        acting_owner: WorkerId,
    ) -> Result<(), HandoverError> {
        self.check_writable(task)?;
        if !acting_owner.is_storable() {
            return Err(HandoverError::InvalidRecord(format!(
                "{acting_owner} is not a valid acting owner for {task}"
            )));
        }
        let record = self
            .staged
            .iter_mut()
            .find(|r| r.task_id == task)
            .ok_or_else(|| HandoverError::InvalidRecord(format!("{task} has no ownership record")))?;
        record.reassign_to(acting_owner);
        Ok(())
    }

    async fn restore_original_owner(&mut self, worker: WorkerId) -> Result<usize, HandoverError> {
        let targets: Vec<TaskId> = self
            .staged
            .iter()
            .filter(|r| r.original_owner_id == worker && r.is_reallocated())
            .map(|r| r.task_id)
            .collect();
        for task in &targets {
            self.check_writable(*task)?;
        }

        for record in self.staged.iter_mut() {
            if record.original_owner_id == worker && record.is_reallocated() {
                record.restore();
            }
        }
        Ok(targets.len())
    }

    async fn commit(mut self: Box<Self>) -> Result<(), HandoverError> {
        *self.guard = std::mem::take(&mut self.staged);
        debug!(rows = self.guard.len(), "in-memory transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), HandoverError> {
        // Dropping the guard discards `staged`.
        Ok(())
    }
}
