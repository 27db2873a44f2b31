//! Domain identifiers (strongly-typed IDs).
//!
//! # 整数 ID + Phantom Type パターン
//! タスクとワーカーの ID は、ストア側（SQL テーブル）の整数キーをそのまま使います。
//! `Id<T>` というジェネリック型で共通実装を提供し、`T` は実行時には使わない
//! マーカー型として、コンパイル時の型安全性を提供します。
//!
//! アーカイブのエントリ ID だけは ULID（生成順でソート可能）を使います。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"task-", "worker-"）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    /// Display で使うプレフィックス
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// JSON 上は素の整数としてシリアライズされます（ストアの列と同じ形）。
///
/// # 例
/// ```ignore
/// let task: TaskId = Id::new(12);
/// let worker: WorkerId = Id::new(7);
/// // task と worker は異なる型なので、混同できない
/// ```
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T: IdMarker> {
    value: u64,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn new(value: u64) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    /// Whether this id fits a store column: positive and at most `i64::MAX`.
    pub fn is_storable(&self) -> bool {
        (1..=MAX_STORED_ID).contains(&self.value)
    }
}

/// Largest identifier a signed 64-bit store column can hold.
pub const MAX_STORED_ID: u64 = i64::MAX as u64;

impl<T: IdMarker> From<u64> for Id<T> {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.value)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// Task のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Task {}

impl IdMarker for Task {
    fn prefix() -> &'static str {
        "task-"
    }
}

/// Worker のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Worker {}

impl IdMarker for Worker {
    fn prefix() -> &'static str {
        "worker-"
    }
}

/// Identifier of a task (stable across reallocations).
pub type TaskId = Id<Task>;

/// Identifier of a worker (original owner, acting owner, substitute).
pub type WorkerId = Id<Worker>;

/// Identifier of an archive entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Ulid);

impl EntryId {
    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for EntryId {
    fn from(ulid: Ulid) -> Self {
        Self(ulid)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry-{}", self.0)
    }
}
