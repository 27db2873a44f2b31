//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: アプリケーションの構築とワイヤリング
//! - **ReallocationEngine**: 不在ワーカーのタスクを代理へ付け替え
//! - **ReturnEngine**: 復帰したワーカーへタスクを返却
//! - **BatchCoordinator**: カレンダーに基づく日次スイープ
//! - **DeliveryLoop**: コミット後の通知・アーカイブを非同期に配送

pub mod builder;
pub mod coordinator;
pub mod delivery_loop;
pub mod effects;
pub mod reallocation;
pub mod return_engine;

#[cfg(test)]
pub(crate) mod testing;

// 主要な型を再エクスポート
pub use self::builder::{App, AppBuilder, BuildError};
pub use self::coordinator::BatchCoordinator;
pub use self::delivery_loop::{DeliveryLoop, QueuedDispatcher};
pub use self::effects::{DeliveryStats, Deliverer, EffectDispatcher, InlineDispatcher, SideEffect};
pub use self::reallocation::ReallocationEngine;
pub use self::return_engine::ReturnEngine;
