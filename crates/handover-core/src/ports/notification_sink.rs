//! NotificationSink port - 通知の記録（ベストエフォート）
//!
//! # 設計原則
//! - 受信者ごとに単調増加するシーケンス番号を採番
//! - メッセージと作成時刻を保存し、保持期限（既定 7 日）を設定
//! - エラーは `HandoverError::Sink` で返すが、エンジン側はログに残して握りつぶす

use async_trait::async_trait;

use crate::domain::{HandoverError, NotificationKey, WorkerId};

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(
        &self,
        recipient: WorkerId,
        message: &str,
    ) -> Result<NotificationKey, HandoverError>;
}
