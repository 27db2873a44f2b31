//! Errors - エラー型と分類
//!
//! 「何もすることがない」（対象タスクなし）はエラーではなく空の結果で表現します。
//! エラーになるのはインフラ障害・トランザクション失敗・副作用の失敗・不正なレコード・エンジン呼び出しの中断のみです。

use thiserror::Error;

use super::ids::WorkerId;

/// ErrorKind は失敗の運用分類
///
/// 境界層（HTTP など）は `kind()` を見てレスポンスを決めます。
/// メッセージ文字列をパースする必要はありません。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// ストアやカレンダーに到達できない
    Infrastructure,
    /// ミューテーションのバッチが失敗し、ロールバックされた
    Transaction,
    /// コミット後の通知・アーカイブの失敗（呼び出し元には伝播しない）
    SideEffect,
    /// ストア境界での検証エラー
    Validation,
    /// エンジン呼び出しがパニック等で中断された（バグ）
    Internal,
}

/// HandoverError はコアの全操作が返すエラー
#[derive(Debug, Error)]
pub enum HandoverError {
    #[error("store unreachable: {0}")]
    Connection(String),

    #[error("transaction for {worker} rolled back: {reason}")]
    Transaction { worker: WorkerId, reason: String },

    #[error("side effect failed: {0}")]
    Sink(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// The engine call for `worker` did not run to completion (it panicked).
    #[error("engine call for {worker} aborted: {reason}")]
    Aborted { worker: WorkerId, reason: String },
}

impl HandoverError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HandoverError::Connection(_) => ErrorKind::Infrastructure,
            HandoverError::Transaction { .. } => ErrorKind::Transaction,
            HandoverError::Sink(_) => ErrorKind::SideEffect,
            HandoverError::InvalidRecord(_) => ErrorKind::Validation,
            HandoverError::Aborted { .. } => ErrorKind::Internal,
        }
    }

    /// Wrap a failure that happened inside `worker`'s transaction.
    ///
    /// Connection losses stay connection failures; everything else becomes a
    /// transaction failure for that worker.
    pub fn within_transaction(self, worker: WorkerId) -> Self {
        match self {
            HandoverError::Connection(_)
            | HandoverError::Transaction { .. }
            | HandoverError::Aborted { .. } => self,
            other => HandoverError::Transaction {
                worker,
                reason: other.to_string(),
            },
        }
    }
}
