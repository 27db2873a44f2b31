//! BatchCoordinator - 日次スイープ（不在者の付け替え・復帰者への返却）
//!
//! # フロー
//! 1. AbsenceCalendar から対象ワーカーを求める（重複は除く）
//! 2. ワーカーごとにエンジンを呼ぶ（最大 `sweep_concurrency` 並列）
//! 3. ワーカーごとの outcome をアーカイブへ渡す
//! 4. SweepReport を返し、SweepCompleted イベントを送る
//!
//! # 失敗時
//! - `FailurePolicy::Continue`: 失敗をレポートに記録して次のワーカーへ
//! - `FailurePolicy::FailFast`: 新しいワーカーの処理を止め、実行中のものが終わるのを待ってエラーを返す
//!
//! 1ワーカー分の処理は途中でキャンセルしません（コミット済みか、ロールバック済みのどちらか）。
//! エンジン呼び出しのパニックはそのワーカーの失敗（`HandoverError::Aborted`）として扱います。

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use super::effects::{EffectDispatcher, SideEffect};
use super::reallocation::ReallocationEngine;
use super::return_engine::ReturnEngine;
use crate::config::FailurePolicy;
use crate::domain::{
    DomainEvent, HandoverError, OutcomeRecord, SweepKind, SweepReport, WorkerId,
    distinct_absent_workers,
};
use crate::ports::AbsenceCalendar;

/// Engines plus the archive path, shared with spawned sweep tasks.
struct SweepContext {
    reallocation: Arc<ReallocationEngine>,
    returns: Arc<ReturnEngine>,
    effects: Arc<dyn EffectDispatcher>,
}

impl SweepContext {
    /// Run one engine call and archive what it produced.
    async fn process(&self, kind: SweepKind, worker: WorkerId) -> Result<usize, HandoverError> {
        let records: Vec<OutcomeRecord> = match kind {
            SweepKind::Reallocation => self
                .reallocation
                .reallocate(worker)
                .await?
                .into_iter()
                .map(OutcomeRecord::from)
                .collect(),
            SweepKind::Return => self
                .returns
                .return_tasks(worker)
                .await?
                .into_iter()
                .map(OutcomeRecord::from)
                .collect(),
        };

        let produced = records.len();
        if produced > 0 {
            self.effects.dispatch(vec![SideEffect::Archive(records)]).await;
        }
        Ok(produced)
    }
}

pub struct BatchCoordinator {
    calendar: Arc<dyn AbsenceCalendar>,
    ctx: Arc<SweepContext>,
    concurrency: usize,
    policy: FailurePolicy,
}

impl BatchCoordinator {
    pub fn new(
        calendar: Arc<dyn AbsenceCalendar>,
        reallocation: Arc<ReallocationEngine>,
        returns: Arc<ReturnEngine>,
        effects: Arc<dyn EffectDispatcher>,
    ) -> Self {
        Self {
            calendar,
            ctx: Arc::new(SweepContext {
                reallocation,
                returns,
                effects,
            }),
            concurrency: 1,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Reallocate the tasks of every worker marked absent on `today`.
    pub async fn run_scheduled_reallocation(
        &self,
        today: NaiveDate,
    ) -> Result<SweepReport, HandoverError> {
        let records = self.calendar.absences_on(today).await?;
        let workers = distinct_absent_workers(&records);
        info!(date = %today, workers = workers.len(), "reallocation sweep started");

        self.sweep(SweepKind::Reallocation, today, workers).await
    }

    /// Return tasks to every worker absent yesterday who is not absent today.
    pub async fn run_scheduled_return(
        &self,
        today: NaiveDate,
    ) -> Result<SweepReport, HandoverError> {
        let yesterday = today.pred_opt().ok_or_else(|| {
            HandoverError::InvalidRecord(format!("{today} has no previous day"))
        })?;

        let was_absent = distinct_absent_workers(&self.calendar.absences_on(yesterday).await?);
        let still_absent: HashSet<WorkerId> = self
            .calendar
            .absences_on(today)
            .await?
            .iter()
            .filter(|r| r.is_absence())
            .map(|r| r.worker_id)
            .collect();

        let workers: Vec<WorkerId> = was_absent
            .into_iter()
            .filter(|w| !still_absent.contains(w))
            .collect();
        info!(date = %today, workers = workers.len(), "return sweep started");

        self.sweep(SweepKind::Return, today, workers).await
    }

    async fn sweep(
        &self,
        kind: SweepKind,
        date: NaiveDate,
        workers: Vec<WorkerId>,
    ) -> Result<SweepReport, HandoverError> {
        let mut report = SweepReport::empty(date);
        let mut pending = workers.into_iter();
        let mut running: JoinSet<(WorkerId, Result<usize, HandoverError>)> = JoinSet::new();
        let mut first_error: Option<HandoverError> = None;

        loop {
            while first_error.is_none() && running.len() < self.concurrency {
                let Some(worker) = pending.next() else { break };
                let ctx = Arc::clone(&self.ctx);
                running.spawn(async move {
                    // Inner task so a panic is attributed to this worker.
                    let result = match tokio::spawn(async move { ctx.process(kind, worker).await })
                        .await
                    {
                        Ok(result) => result,
                        Err(join_err) => Err(HandoverError::Aborted {
                            worker,
                            reason: join_err.to_string(),
                        }),
                    };
                    (worker, result)
                });
            }

            let Some(joined) = running.join_next().await else {
                break;
            };

            match joined {
                Ok((_, Ok(produced))) => report.record_success(produced),
                Ok((worker, Err(e))) => {
                    warn!(?kind, worker = %worker, error = %e, "worker failed during sweep");
                    report.record_failure(worker, &e);
                    if self.policy == FailurePolicy::FailFast && first_error.is_none() {
                        first_error = Some(e);
                    }
                }
                Err(join_err) => error!(?kind, error = %join_err, "sweep task cancelled"),
            }
        }

        if let Some(e) = first_error {
            error!(?kind, date = %date, processed = report.processed_count, "sweep stopped at first failure");
            return Err(e);
        }

        info!(
            ?kind,
            date = %date,
            processed = report.processed_count,
            outcomes = report.total_outcomes,
            failed = report.failed_workers.len(),
            "sweep finished"
        );
        self.ctx
            .effects
            .dispatch(vec![SideEffect::Event(DomainEvent::SweepCompleted {
                kind,
                date,
                processed_count: report.processed_count,
                total_outcomes: report.total_outcomes,
                failed: report.failed_workers.len(),
            })])
            .await;

        Ok(report)
    }
}
