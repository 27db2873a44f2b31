//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 開発体験の改善（明確なエラーメッセージ）

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::coordinator::BatchCoordinator;
use super::delivery_loop::DeliveryLoop;
use super::effects::{Deliverer, EffectDispatcher, InlineDispatcher, SideEffect};
use super::reallocation::ReallocationEngine;
use super::return_engine::ReturnEngine;
use crate::config::{DeliveryMode, HandoverConfig};
use crate::domain::{
    HandoverError, OutcomeRecord, ReallocationOutcome, ReturnOutcome, SweepReport, WorkerId,
};
use crate::ports::{
    AbsenceCalendar, Clock, EventSink, NoopEventSink, NotificationSink, OutcomeArchive,
    OwnershipStore, SubstituteMatcher, SystemClock,
};

/// AppBuilder はアプリケーションを構築
///
/// # 使用例
/// ```ignore
/// let app = AppBuilder::new()
///     .ownership_store(store)
///     .substitute_matcher(matcher)
///     .absence_calendar(calendar)
///     .notification_sink(notifications)
///     .outcome_archive(archive)
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - 必須ポート（store / matcher / calendar / notifications / archive）が揃っているか build() でチェック
/// - 不足があれば BuildError::MissingPorts で全て列挙
/// - Clock と EventSink は省略可（SystemClock / NoopEventSink）
pub struct AppBuilder {
    store: Option<Arc<dyn OwnershipStore>>,
    matcher: Option<Arc<dyn SubstituteMatcher>>,
    calendar: Option<Arc<dyn AbsenceCalendar>>,
    notifications: Option<Arc<dyn NotificationSink>>,
    archive: Option<Arc<dyn OutcomeArchive>>,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    config: HandoverConfig,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing ports: {0:?}. These ports are required but were not provided.")]
    MissingPorts(Vec<&'static str>),

    #[error("queued delivery needs a running Tokio runtime")]
    NoRuntime,
}

impl AppBuilder {
    /// 新しい AppBuilder を作成
    pub fn new() -> Self {
        Self {
            store: None,
            matcher: None,
            calendar: None,
            notifications: None,
            archive: None,
            events: Arc::new(NoopEventSink),
            clock: Arc::new(SystemClock),
            config: HandoverConfig::default(),
        }
    }

    pub fn ownership_store(mut self, store: Arc<dyn OwnershipStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn substitute_matcher(mut self, matcher: Arc<dyn SubstituteMatcher>) -> Self {
        self.matcher = Some(matcher);
        self
    }

    pub fn absence_calendar(mut self, calendar: Arc<dyn AbsenceCalendar>) -> Self {
        self.calendar = Some(calendar);
        self
    }

    pub fn notification_sink(mut self, notifications: Arc<dyn NotificationSink>) -> Self {
        self.notifications = Some(notifications);
        self
    }

    pub fn outcome_archive(mut self, archive: Arc<dyn OutcomeArchive>) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(mut self, config: HandoverConfig) -> Self {
        self.config = config;
        self
    }

    /// AppBuilder を構築して App を生成
    ///
    /// # 検証
    /// - 必須ポートが全て設定されているかチェック
    /// - `DeliveryMode::Queued` の場合は Tokio ランタイム上で呼ぶ必要がある（DeliveryLoop を spawn するため）
    pub fn build(self) -> Result<App, BuildError> {
        let mut missing = Vec::new();
        if self.store.is_none() {
            missing.push("ownership_store");
        }
        if self.matcher.is_none() {
            missing.push("substitute_matcher");
        }
        if self.calendar.is_none() {
            missing.push("absence_calendar");
        }
        if self.notifications.is_none() {
            missing.push("notification_sink");
        }
        if self.archive.is_none() {
            missing.push("outcome_archive");
        }
        let (Some(store), Some(matcher), Some(calendar), Some(notifications), Some(archive)) = (
            self.store,
            self.matcher,
            self.calendar,
            self.notifications,
            self.archive,
        ) else {
            return Err(BuildError::MissingPorts(missing));
        };

        let deliverer = Arc::new(Deliverer::new(notifications, archive, self.events));
        let mut delivery: Option<JoinHandle<()>> = None;
        let effects: Arc<dyn EffectDispatcher> = match self.config.delivery {
            DeliveryMode::Inline => Arc::new(InlineDispatcher::new(deliverer)),
            DeliveryMode::Queued => {
                if tokio::runtime::Handle::try_current().is_err() {
                    return Err(BuildError::NoRuntime);
                }
                let (dispatcher, delivery_loop) =
                    DeliveryLoop::channel(deliverer, self.config.delivery_buffer);
                delivery = Some(delivery_loop.spawn());
                Arc::new(dispatcher)
            }
        };

        let reallocation = Arc::new(ReallocationEngine::new(
            Arc::clone(&store),
            matcher,
            Arc::clone(&self.clock),
            Arc::clone(&effects),
        ));
        let returns = Arc::new(ReturnEngine::new(
            store,
            Arc::clone(&self.clock),
            Arc::clone(&effects),
        ));
        let coordinator = BatchCoordinator::new(
            calendar,
            Arc::clone(&reallocation),
            Arc::clone(&returns),
            Arc::clone(&effects),
        )
        .with_concurrency(self.config.sweep_concurrency)
        .with_failure_policy(self.config.failure_policy);

        info!(
            delivery = ?self.config.delivery,
            concurrency = self.config.sweep_concurrency,
            policy = ?self.config.failure_policy,
            "handover app built"
        );

        Ok(App {
            reallocation,
            returns,
            coordinator,
            effects,
            clock: self.clock,
            delivery,
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// App はアプリケーションのランタイム
///
/// 単発の付け替え・返却と、日次スイープの入口です。
/// 単発の呼び出しでも outcome はアーカイブへ渡します（ベストエフォート）。
pub struct App {
    reallocation: Arc<ReallocationEngine>,
    returns: Arc<ReturnEngine>,
    coordinator: BatchCoordinator,
    effects: Arc<dyn EffectDispatcher>,
    clock: Arc<dyn Clock>,
    delivery: Option<JoinHandle<()>>,
}

impl App {
    pub async fn reallocate(
        &self,
        absent_worker: WorkerId,
    ) -> Result<Vec<ReallocationOutcome>, HandoverError> {
        let outcomes = self.reallocation.reallocate(absent_worker).await?;
        self.archive(outcomes.iter().cloned().map(OutcomeRecord::from).collect())
            .await;
        Ok(outcomes)
    }

    pub async fn return_tasks(
        &self,
        returning_worker: WorkerId,
    ) -> Result<Vec<ReturnOutcome>, HandoverError> {
        let outcomes = self.returns.return_tasks(returning_worker).await?;
        self.archive(outcomes.iter().cloned().map(OutcomeRecord::from).collect())
            .await;
        Ok(outcomes)
    }

    /// `today` defaults to the clock's current date.
    pub async fn run_scheduled_reallocation(
        &self,
        today: Option<NaiveDate>,
    ) -> Result<SweepReport, HandoverError> {
        let today = today.unwrap_or_else(|| self.clock.today());
        self.coordinator.run_scheduled_reallocation(today).await
    }

    /// `today` defaults to the clock's current date.
    pub async fn run_scheduled_return(
        &self,
        today: Option<NaiveDate>,
    ) -> Result<SweepReport, HandoverError> {
        let today = today.unwrap_or_else(|| self.clock.today());
        self.coordinator.run_scheduled_return(today).await
    }

    /// Stop accepting work and wait until queued effects have been delivered.
    pub async fn shutdown(self) {
        let App {
            reallocation,
            returns,
            coordinator,
            effects,
            delivery,
            ..
        } = self;
        // The loop ends once every dispatcher handle is gone.
        drop((reallocation, returns, coordinator, effects));

        if let Some(handle) = delivery {
            if let Err(e) = handle.await {
                warn!(error = %e, "delivery loop ended abnormally");
            }
        }
    }

    async fn archive(&self, records: Vec<OutcomeRecord>) {
        if records.is_empty() {
            return;
        }
        self.effects.dispatch(vec![SideEffect::Archive(records)]).await;
    }
}
