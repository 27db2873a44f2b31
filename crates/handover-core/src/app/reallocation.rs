//! ReallocationEngine - 不在ワーカーのタスクを代理に付け替える
//!
//! # フロー
//! 1. OwnershipStore::begin() でトランザクション開始
//! 2. 不在ワーカーが acting owner のレコードを取得
//! 3. SubstituteMatcher で各タスクの代理を決定
//! 4. 代理がいるタスクだけ acting owner を更新（1件でも失敗したら全件ロールバック）
//! 5. コミット後に通知とイベントを EffectDispatcher へ渡す
//!
//! # 不変条件
//! - original owner は決して変更しない
//! - 代理がいないタスクは acting owner をそのままにし、理由付きの outcome を返す
//! - 対象タスクがなければ空の結果（エラーではない）

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::effects::{EffectDispatcher, SideEffect};
use crate::domain::notification::{not_reallocated_message, reallocated_message};
use crate::domain::{
    DomainEvent, HandoverError, NO_QUALIFIED_SUBSTITUTE, ReallocationOutcome, TaskId, WorkerId,
};
use crate::ports::{Clock, OwnershipStore, OwnershipTransaction, SubstituteMatcher};

pub struct ReallocationEngine {
    store: Arc<dyn OwnershipStore>,
    matcher: Arc<dyn SubstituteMatcher>,
    clock: Arc<dyn Clock>,
    effects: Arc<dyn EffectDispatcher>,
}

impl ReallocationEngine {
    pub fn new(
        store: Arc<dyn OwnershipStore>,
        matcher: Arc<dyn SubstituteMatcher>,
        clock: Arc<dyn Clock>,
        effects: Arc<dyn EffectDispatcher>,
    ) -> Self {
        Self {
            store,
            matcher,
            clock,
            effects,
        }
    }

    /// Hand every task `absent_worker` is acting on to a qualified substitute.
    ///
    /// Returns one outcome per task, in store order. All ownership updates
    /// land in one transaction; if any of them fails nothing is changed and
    /// no notification is sent.
    pub async fn reallocate(
        &self,
        absent_worker: WorkerId,
    ) -> Result<Vec<ReallocationOutcome>, HandoverError> {
        let mut tx = self.store.begin().await?;

        let outcomes = match self.reallocate_in(tx.as_mut(), absent_worker).await {
            Ok(outcomes) => outcomes,
            Err(e) => {
                let err = e.within_transaction(absent_worker);
                warn!(worker = %absent_worker, error = %err, "reallocation rolled back");
                if let Err(rb) = tx.rollback().await {
                    warn!(worker = %absent_worker, error = %rb, "rollback failed");
                }
                return Err(err);
            }
        };

        tx.commit()
            .await
            .map_err(|e| e.within_transaction(absent_worker))?;

        if outcomes.is_empty() {
            debug!(worker = %absent_worker, "no tasks to reallocate");
            return Ok(outcomes);
        }

        let reallocated = outcomes.iter().filter(|o| o.reallocated).count();
        let skipped = outcomes.len() - reallocated;
        info!(worker = %absent_worker, reallocated, skipped, "reallocation committed");

        let mut effects: Vec<SideEffect> = outcomes.iter().map(notification_for).collect();
        effects.push(SideEffect::Event(DomainEvent::TasksReallocated {
            absent_worker_id: absent_worker,
            reallocated,
            skipped,
        }));
        self.effects.dispatch(effects).await;

        Ok(outcomes)
    }

    async fn reallocate_in(
        &self,
        tx: &mut dyn OwnershipTransaction,
        absent_worker: WorkerId,
    ) -> Result<Vec<ReallocationOutcome>, HandoverError> {
        let records = tx.tasks_acting_for(absent_worker).await?;
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let verdicts: HashMap<TaskId, Option<WorkerId>> = self
            .matcher
            .find_substitutes(absent_worker)
            .await?
            .into_iter()
            .map(|c| (c.task_id, c.substitute_id))
            .collect();

        let executed_at = self.clock.now();
        let mut outcomes = Vec::with_capacity(records.len());

        for record in records {
            let Some(verdict) = verdicts.get(&record.task_id) else {
                debug!(task = %record.task_id, "matcher returned no verdict; task left alone");
                continue;
            };

            let substitute = match *verdict {
                Some(s) if s == absent_worker => {
                    warn!(task = %record.task_id, worker = %absent_worker, "matcher proposed the absent worker; ignored");
                    None
                }
                Some(s) if !s.is_storable() => {
                    warn!(task = %record.task_id, substitute = s.value(), "matcher proposed an invalid worker id; ignored");
                    None
                }
                other => other,
            };

            let outcome = match substitute {
                Some(substitute) => {
                    tx.set_acting_owner(record.task_id, substitute).await?;
                    ReallocationOutcome::reallocated(
                        record.task_id,
                        record.original_owner_id,
                        absent_worker,
                        substitute,
                        executed_at,
                    )
                }
                None => ReallocationOutcome::not_reallocated(
                    record.task_id,
                    record.original_owner_id,
                    absent_worker,
                    NO_QUALIFIED_SUBSTITUTE,
                    executed_at,
                ),
            };
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }
}

fn notification_for(outcome: &ReallocationOutcome) -> SideEffect {
    match outcome.substitute_id {
        Some(substitute) if outcome.reallocated => {
            SideEffect::notify(substitute, reallocated_message(outcome.task_id))
        }
        _ => SideEffect::notify(
            outcome.absent_worker_id,
            not_reallocated_message(outcome.task_id),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::{Harness, t, w};
    use crate::domain::{ErrorKind, OwnershipRow, TaskOwnership};
    use rstest::rstest;

    #[tokio::test]
    async fn reallocates_where_a_substitute_exists() {
        let h = Harness::worker_seven();
        h.matcher.set(w(7), t(1), None);
        h.matcher.set(w(7), t(2), Some(w(9)));

        let outcomes = h.reallocation_engine().reallocate(w(7)).await.unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].task_id, t(1));
        assert!(!outcomes[0].reallocated);
        assert_eq!(outcomes[0].reason.as_deref(), Some(NO_QUALIFIED_SUBSTITUTE));
        assert_eq!(outcomes[0].substitute_id, None);
        assert_eq!(outcomes[1].task_id, t(2));
        assert!(outcomes[1].reallocated);
        assert_eq!(outcomes[1].substitute_id, Some(w(9)));
        assert_eq!(outcomes[1].original_owner_id, w(7));

        let t1 = h.store.get(t(1)).await.unwrap();
        let t2 = h.store.get(t(2)).await.unwrap();
        assert_eq!(t1.acting_owner_id, w(7));
        assert_eq!(t2.acting_owner_id, w(9));
        assert_eq!(t2.original_owner_id, w(7));

        assert_eq!(
            h.messages_for(w(9)).await,
            vec!["Task 2 has been temporarily reallocated to you."]
        );
        assert_eq!(
            h.messages_for(w(7)).await,
            vec!["Task 1 could not be reallocated: no qualified substitute found."]
        );
        assert_eq!(
            h.events.events().await,
            vec![DomainEvent::TasksReallocated {
                absent_worker_id: w(7),
                reallocated: 1,
                skipped: 1,
            }]
        );
    }

    #[tokio::test]
    async fn worker_without_tasks_gets_empty_result() {
        let h = Harness::worker_seven();

        let outcomes = h.reallocation_engine().reallocate(w(42)).await.unwrap();

        assert!(outcomes.is_empty());
        assert!(h.notifications.all().await.is_empty());
        assert!(h.events.events().await.is_empty());
    }

    #[tokio::test]
    async fn tasks_missing_from_matcher_output_are_skipped() {
        let h = Harness::worker_seven();
        h.matcher.set(w(7), t(2), Some(w(9)));

        let outcomes = h.reallocation_engine().reallocate(w(7)).await.unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].task_id, t(2));
        assert_eq!(h.store.get(t(1)).await.unwrap().acting_owner_id, w(7));
    }

    #[tokio::test]
    async fn absent_worker_as_substitute_counts_as_none() {
        let h = Harness::worker_seven();
        h.matcher.set(w(7), t(1), Some(w(7)));

        let outcomes = h.reallocation_engine().reallocate(w(7)).await.unwrap();

        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].reallocated);
        assert_eq!(h.store.get(t(1)).await.unwrap().acting_owner_id, w(7));
    }

    #[rstest]
    #[case::zero(0)]
    #[case::beyond_signed_range(u64::MAX)]
    #[tokio::test]
    async fn invalid_substitute_id_counts_as_none(#[case] substitute: u64) {
        let h = Harness::worker_seven();
        h.matcher.set(w(7), t(2), Some(w(substitute)));

        let outcomes = h.reallocation_engine().reallocate(w(7)).await.unwrap();

        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].reallocated);
        assert_eq!(outcomes[0].substitute_id, None);
        assert_eq!(outcomes[0].reason.as_deref(), Some(NO_QUALIFIED_SUBSTITUTE));
        let record = h.store.get(t(2)).await.unwrap();
        assert_eq!(record.acting_owner_id, w(7));
        assert!(OwnershipRow::try_from(record).is_ok());
        assert_eq!(
            h.messages_for(w(7)).await,
            vec!["Task 2 could not be reallocated: no qualified substitute found."]
        );
    }

    #[tokio::test]
    async fn reallocating_a_substitute_keeps_original_owner() {
        let h = Harness::new([TaskOwnership {
            task_id: t(5),
            original_owner_id: w(3),
            acting_owner_id: w(9),
        }]);
        h.matcher.set(w(9), t(5), Some(w(11)));

        let outcomes = h.reallocation_engine().reallocate(w(9)).await.unwrap();

        assert_eq!(outcomes[0].original_owner_id, w(3));
        let record = h.store.get(t(5)).await.unwrap();
        assert_eq!(record.original_owner_id, w(3));
        assert_eq!(record.acting_owner_id, w(11));
    }

    #[tokio::test]
    async fn failed_update_rolls_back_everything() {
        let h = Harness::new([
            TaskOwnership::assigned(t(1), w(7)),
            TaskOwnership::assigned(t(2), w(7)),
            TaskOwnership::assigned(t(3), w(7)),
        ]);
        for task in [1, 2, 3] {
            h.matcher.set(w(7), t(task), Some(w(9)));
        }
        h.store.fail_updates_for(t(3));
        let before = h.store.snapshot().await;

        let err = h.reallocation_engine().reallocate(w(7)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transaction);
        assert_eq!(h.store.snapshot().await, before);
        assert!(h.notifications.all().await.is_empty());
        assert!(h.events.events().await.is_empty());
    }

    #[tokio::test]
    async fn unreachable_store_is_a_connection_failure() {
        let h = Harness::worker_seven();
        h.store.set_unreachable(true);

        let err = h.reallocation_engine().reallocate(w(7)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Infrastructure);
    }

    #[tokio::test]
    async fn matcher_outage_changes_nothing() {
        let h = Harness::worker_seven();
        h.matcher.set(w(7), t(1), Some(w(9)));
        h.matcher.set_unavailable(true);

        let err = h.reallocation_engine().reallocate(w(7)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert_eq!(h.store.get(t(1)).await.unwrap().acting_owner_id, w(7));
    }

    #[tokio::test]
    async fn notification_failure_does_not_undo_commit() {
        let h = Harness::worker_seven();
        h.matcher.set(w(7), t(2), Some(w(9)));
        h.notifications.set_failing(true);

        let outcomes = h.reallocation_engine().reallocate(w(7)).await.unwrap();

        assert!(outcomes[0].reallocated);
        assert_eq!(h.store.get(t(2)).await.unwrap().acting_owner_id, w(9));
    }

    #[tokio::test]
    async fn outcomes_share_one_timestamp() {
        let h = Harness::worker_seven();
        h.matcher.set(w(7), t(1), Some(w(8)));
        h.matcher.set(w(7), t(2), Some(w(9)));

        let outcomes = h.reallocation_engine().reallocate(w(7)).await.unwrap();

        assert_eq!(outcomes[0].executed_at, h.clock.now());
        assert_eq!(outcomes[0].executed_at, outcomes[1].executed_at);
    }
}
