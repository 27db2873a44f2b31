//! RecordingEventSink - 受け取ったイベントを保持するだけの EventSink（テスト・CLI 用）

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::domain::DomainEvent;
use crate::ports::EventSink;

#[derive(Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl EventSink for RecordingEventSink {
    async fn emit(&self, event: DomainEvent) {
        info!(?event, "domain event");
        self.events.lock().await.push(event);
    }
}
