//! ReturnEngine - 復帰したワーカーにタスクを戻す
//!
//! 現在の acting owner が誰であっても、`original_owner_id == worker` かつ
//! 付け替え中のレコードはすべて元の持ち主に戻します。
//! 2回続けて呼んでも2回目は空の結果になります（冪等）。

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::effects::{EffectDispatcher, SideEffect};
use crate::domain::notification::returned_message;
use crate::domain::{DomainEvent, HandoverError, ReturnOutcome, WorkerId};
use crate::ports::{Clock, OwnershipStore, OwnershipTransaction};

pub struct ReturnEngine {
    store: Arc<dyn OwnershipStore>,
    clock: Arc<dyn Clock>,
    effects: Arc<dyn EffectDispatcher>,
}

impl ReturnEngine {
    pub fn new(
        store: Arc<dyn OwnershipStore>,
        clock: Arc<dyn Clock>,
        effects: Arc<dyn EffectDispatcher>,
    ) -> Self {
        Self {
            store,
            clock,
            effects,
        }
    }

    /// Give `returning_worker` back every task currently reallocated away
    /// from them.
    ///
    /// `previous_acting_owner_id` in each outcome is read before the update.
    pub async fn return_tasks(
        &self,
        returning_worker: WorkerId,
    ) -> Result<Vec<ReturnOutcome>, HandoverError> {
        let mut tx = self.store.begin().await?;

        let outcomes = match self.return_in(tx.as_mut(), returning_worker).await {
            Ok(outcomes) => outcomes,
            Err(e) => {
                let err = e.within_transaction(returning_worker);
                warn!(worker = %returning_worker, error = %err, "return rolled back");
                if let Err(rb) = tx.rollback().await {
                    warn!(worker = %returning_worker, error = %rb, "rollback failed");
                }
                return Err(err);
            }
        };

        tx.commit()
            .await
            .map_err(|e| e.within_transaction(returning_worker))?;

        if outcomes.is_empty() {
            debug!(worker = %returning_worker, "nothing to return");
            return Ok(outcomes);
        }

        info!(worker = %returning_worker, returned = outcomes.len(), "tasks returned");

        let mut effects: Vec<SideEffect> = outcomes
            .iter()
            .map(|o| SideEffect::notify(returning_worker, returned_message(o.task_id)))
            .collect();
        effects.push(SideEffect::Event(DomainEvent::TasksReturned {
            returning_worker_id: returning_worker,
            returned: outcomes.len(),
        }));
        self.effects.dispatch(effects).await;

        Ok(outcomes)
    }

    async fn return_in(
        &self,
        tx: &mut dyn OwnershipTransaction,
        returning_worker: WorkerId,
    ) -> Result<Vec<ReturnOutcome>, HandoverError> {
        let records = tx.reallocated_from(returning_worker).await?;
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let restored = tx.restore_original_owner(returning_worker).await?;
        if restored != records.len() {
            // Same transaction, so this only happens with a misbehaving store.
            return Err(HandoverError::InvalidRecord(format!(
                "expected to restore {} rows, store changed {restored}",
                records.len()
            )));
        }

        let executed_at = self.clock.now();
        Ok(records
            .into_iter()
            .map(|r| ReturnOutcome {
                task_id: r.task_id,
                original_owner_id: r.original_owner_id,
                previous_acting_owner_id: r.acting_owner_id,
                returning_worker_id: returning_worker,
                executed_at,
            })
            .collect())
    }
}
