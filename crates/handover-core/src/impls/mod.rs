//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports のメモリ実装を含めます。
//!
//! # 含まれる実装
//! - **InMemoryOwnershipStore**: トランザクション付きの所有権テーブル
//! - **StaticSubstituteMatcher**: 固定の代理表
//! - **InMemoryAbsenceCalendar**: 出欠カレンダー
//! - **InMemoryNotificationSink**: TTL 付き通知ストア
//! - **InMemoryOutcomeArchive**: 追記のみのレポート保存先
//! - **RecordingEventSink**: ドメインイベントの記録
//!
//! # 本番用実装
//! SQL ストア・KV ストア・ドキュメント DB の実装は別クレートに配置します。

pub mod memory_archive;
pub mod memory_calendar;
pub mod memory_notifications;
pub mod memory_store;
pub mod recording_events;
pub mod static_matcher;

// 主要な型を再エクスポート
pub use self::memory_archive::InMemoryOutcomeArchive;
pub use self::memory_calendar::InMemoryAbsenceCalendar;
pub use self::memory_notifications::InMemoryNotificationSink;
pub use self::memory_store::InMemoryOwnershipStore;
pub use self::recording_events::RecordingEventSink;
pub use self::static_matcher::StaticSubstituteMatcher;
