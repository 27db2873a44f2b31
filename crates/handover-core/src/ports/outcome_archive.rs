//! OutcomeArchive port - 実行結果レポートの保存先（追記のみ）
//!
//! 冪等性は保証しません。同じ outcome を 2 回記録すると 2 エントリになります。
//! 1 つの論理イベントにつき 1 回だけ記録するのは呼び出し側の責任です。

use async_trait::async_trait;

use crate::domain::{HandoverError, OutcomeRecord};

#[async_trait]
pub trait OutcomeArchive: Send + Sync {
    /// Append `outcomes` as one batch. Returns the number of entries written.
    async fn record(&self, outcomes: &[OutcomeRecord]) -> Result<usize, HandoverError>;
}
