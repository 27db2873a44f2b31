//! EventSink port - ドメインイベント記録の抽象化
//!
//! - NoopEventSink: 何もしない（既定）
//! - 監査ログやメトリクスへの送信は実装側で

use async_trait::async_trait;

use crate::domain::DomainEvent;

/// EventSink はドメインイベントを受け取る
///
/// イベントの記録失敗で処理を止めることはないので、戻り値はありません。
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: DomainEvent);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

#[async_trait]
impl EventSink for NoopEventSink {
    async fn emit(&self, _event: DomainEvent) {}
}
