//! DeliveryLoop - コミット後の副作用を非同期に配送する
//!
//! # フロー
//! 1. エンジンがコミット後に `QueuedDispatcher::dispatch()` で副作用のバッチを送信
//! 2. DeliveryLoop がチャネルから受け取り、Deliverer で通知・アーカイブ・イベントを処理
//! 3. 送信側（dispatcher）が全て drop されるとループは残りを処理して終了
//!
//! 所有権ストアの耐久性と、通知・アーカイブ先の可用性を切り離すための仕組みです。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::effects::{Deliverer, EffectDispatcher, SideEffect};

/// Sending half: hands effect batches to the loop.
#[derive(Clone)]
pub struct QueuedDispatcher {
    tx: mpsc::Sender<Vec<SideEffect>>,
}

#[async_trait]
impl EffectDispatcher for QueuedDispatcher {
    async fn dispatch(&self, effects: Vec<SideEffect>) {
        if effects.is_empty() {
            return;
        }
        let count = effects.len();
        // Waits for capacity when the channel is full.
        if self.tx.send(effects).await.is_err() {
            warn!(dropped = count, "delivery loop has stopped; effects dropped");
        }
    }
}

pub struct DeliveryLoop {
    rx: mpsc::Receiver<Vec<SideEffect>>,
    deliverer: Arc<Deliverer>,
}

impl DeliveryLoop {
    /// Create a connected dispatcher/loop pair with room for `capacity` batches.
    pub fn channel(deliverer: Arc<Deliverer>, capacity: usize) -> (QueuedDispatcher, DeliveryLoop) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (QueuedDispatcher { tx }, DeliveryLoop { rx, deliverer })
    }

    /// Drain batches until every dispatcher has been dropped.
    pub async fn run(mut self) {
        let mut batches = 0usize;
        while let Some(batch) = self.rx.recv().await {
            batches += 1;
            let stats = self.deliverer.deliver_all(batch).await;
            debug!(
                delivered = stats.delivered,
                failed = stats.failed,
                "effect batch processed"
            );
        }
        info!(batches, "delivery loop finished");
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
