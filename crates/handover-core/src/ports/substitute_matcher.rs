//! SubstituteMatcher port - 代理担当者の検索（外部クエリ）
//!
//! 資格の照合ロジックそのものはコアの外にあります。
//! コアは「不在ワーカー 1 人につき 1 回」呼び出すだけです。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{HandoverError, TaskId, WorkerId};

/// Matcher verdict for one task of the absent worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstituteCandidate {
    pub task_id: TaskId,
    #[serde(default)]
    pub substitute_id: Option<WorkerId>,
}

impl SubstituteCandidate {
    pub fn some(task_id: TaskId, substitute_id: WorkerId) -> Self {
        Self {
            task_id,
            substitute_id: Some(substitute_id),
        }
    }

    pub fn none(task_id: TaskId) -> Self {
        Self {
            task_id,
            substitute_id: None,
        }
    }
}

/// SubstituteMatcher は不在ワーカーの各タスクに代理を割り当てる
///
/// 同点時の選び方（tie-break）は実装側に任せます。
#[async_trait]
pub trait SubstituteMatcher: Send + Sync {
    async fn find_substitutes(
        &self,
        absent_worker: WorkerId,
    ) -> Result<Vec<SubstituteCandidate>, HandoverError>;
}
