//! StaticSubstituteMatcher - 事前に決めた代理表を返す matcher
//!
//! 本番では資格テーブルを引く SQL 関数などが実装します。
//! ここでは「不在ワーカー → (タスク, 代理)」の表をそのまま返します。

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::{HandoverError, TaskId, WorkerId};
use crate::ports::{SubstituteCandidate, SubstituteMatcher};

#[derive(Default)]
pub struct StaticSubstituteMatcher {
    table: Mutex<HashMap<WorkerId, Vec<SubstituteCandidate>>>,
    unavailable: Mutex<bool>,
}

impl StaticSubstituteMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style: `task` of `absent` goes to `substitute` (or nobody).
    pub fn with(self, absent: WorkerId, task: TaskId, substitute: Option<WorkerId>) -> Self {
        self.set(absent, task, substitute);
        self
    }

    /// Replace (or add) the verdict for `task` when `absent` is away.
    pub fn set(&self, absent: WorkerId, task: TaskId, substitute: Option<WorkerId>) {
        let mut table = lock(&self.table);
        let entries = table.entry(absent).or_default();
        let candidate = SubstituteCandidate {
            task_id: task,
            substitute_id: substitute,
        };
        match entries.iter_mut().find(|c| c.task_id == task) {
            Some(existing) => *existing = candidate,
            None => entries.push(candidate),
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *lock(&self.unavailable) = unavailable;
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl SubstituteMatcher for StaticSubstituteMatcher {
    async fn find_substitutes(
        &self,
        absent_worker: WorkerId,
    ) -> Result<Vec<SubstituteCandidate>, HandoverError> {
        if *lock(&self.unavailable) {
            return Err(HandoverError::Connection(
                "substitute matcher unavailable".to_string(),
            ));
        }
        Ok(lock(&self.table)
            .get(&absent_worker)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_table_for_worker() {
        let matcher = StaticSubstituteMatcher::new()
            .with(WorkerId::new(7), TaskId::new(1), None)
            .with(WorkerId::new(7), TaskId::new(2), Some(WorkerId::new(9)));

        let found = matcher.find_substitutes(WorkerId::new(7)).await.unwrap();
        assert_eq!(
            found,
            vec![
                SubstituteCandidate::none(TaskId::new(1)),
                SubstituteCandidate::some(TaskId::new(2), WorkerId::new(9)),
            ]
        );

        let other = matcher.find_substitutes(WorkerId::new(8)).await.unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn set_overwrites_previous_verdict() {
        let matcher = StaticSubstituteMatcher::new();
        matcher.set(WorkerId::new(7), TaskId::new(1), None);
        matcher.set(WorkerId::new(7), TaskId::new(1), Some(WorkerId::new(4)));

        let found = matcher.find_substitutes(WorkerId::new(7)).await.unwrap();
        assert_eq!(found, vec![SubstituteCandidate::some(TaskId::new(1), WorkerId::new(4))]);
    }
}
