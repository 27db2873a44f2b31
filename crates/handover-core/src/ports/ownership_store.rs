//! OwnershipStore port - タスク所有権の正本（source of truth）
//!
//! 所有権テーブル（task_id, original_owner_id, acting_owner_id）への
//! トランザクショナルな読み書きを提供します。
//!
//! # 設計原則
//! - 変更は必ず `OwnershipTransaction` の中で行う
//! - `commit()` されなかったトランザクションは drop 時にロールバックされる
//!   （成功・業務エラー・インフラエラーのどの経路でも接続が解放される）
//! - 読み取り結果は同じトランザクション内の更新の前提として使う
//!   （別スナップショットに基づいて更新しない）

use async_trait::async_trait;

use crate::domain::{HandoverError, TaskId, TaskOwnership, WorkerId};

/// Connection provider: hands out one exclusive transaction at a time per
/// connection, blocking until it can be acquired.
#[async_trait]
pub trait OwnershipStore: Send + Sync {
    /// Open a transaction. Fails with `HandoverError::Connection` when the
    /// store cannot be reached.
    async fn begin(&self) -> Result<Box<dyn OwnershipTransaction>, HandoverError>;
}

/// An open transaction against the ownership table.
///
/// Dropping it without `commit` discards every staged change.
#[async_trait]
pub trait OwnershipTransaction: Send {
    /// Records whose acting owner is `worker`, in store iteration order.
    async fn tasks_acting_for(
        &mut self,
        worker: WorkerId,
    ) -> Result<Vec<TaskOwnership>, HandoverError>;

    /// Records originally owned by `worker` that are currently acted on by
    /// someone else, in store iteration order.
    async fn reallocated_from(
        &mut self,
        worker: WorkerId,
    ) -> Result<Vec<TaskOwnership>, HandoverError>;

    /// Set one record's acting owner.
    async fn set_acting_owner(
        &mut self,
        task: TaskId,
        acting_owner: WorkerId,
    ) -> Result<(), HandoverError>;

    /// Batch statement: `acting := original` for every record originally owned
    /// by `worker` whose acting owner differs. Returns the number of rows changed.
    async fn restore_original_owner(&mut self, worker: WorkerId) -> Result<usize, HandoverError>;

    async fn commit(self: Box<Self>) -> Result<(), HandoverError>;

    async fn rollback(self: Box<Self>) -> Result<(), HandoverError>;
}
