//! handover-core
//!
//! Core building blocks for covering absent workers' tasks.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, ownership, absence, outcome, notification, report, errors, events）
//! - **ports**: 抽象化レイヤー（OwnershipStore, SubstituteMatcher, AbsenceCalendar, NotificationSink, OutcomeArchive, など）
//! - **app**: アプリケーションロジック（ReallocationEngine, ReturnEngine, BatchCoordinator, AppBuilder, DeliveryLoop）
//! - **impls**: 実装（InMemoryOwnershipStore など開発用）
//! - **config**: 環境変数からの設定読み込み

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
