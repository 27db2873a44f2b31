//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（SQL ストア、通知ストア、レポート DB、カレンダー）への
//! インターフェースを提供し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - OwnershipStore が所有権の source of truth（正本）
//! - 通知とアーカイブはコミット後のベストエフォート
//! - カレンダーと代理検索は読み取り専用の外部サービス

pub mod absence_calendar;
pub mod clock;
pub mod event_sink;
pub mod id_generator;
pub mod notification_sink;
pub mod outcome_archive;
pub mod ownership_store;
pub mod substitute_matcher;

// 主要な trait を再エクスポート
pub use self::absence_calendar::AbsenceCalendar;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::event_sink::{EventSink, NoopEventSink};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::notification_sink::NotificationSink;
pub use self::outcome_archive::OutcomeArchive;
pub use self::ownership_store::{OwnershipStore, OwnershipTransaction};
pub use self::substitute_matcher::{SubstituteCandidate, SubstituteMatcher};
