//! App - active object 本体
//!
//! # 主要コンポーネント
//! - **ActiveObject**: 投入 API（execute_async / execute_sync / destroy）
//! - **ActiveObjectBuilder**: 設定と起動時検証
//! - **WorkerLoop**: default mode / polling mode の実行ループ
//! - **Status**: 統計とライフサイクルのスナップショット

pub mod active_object;
pub mod builder;
pub mod status;
pub(crate) mod worker_loop;

pub use self::active_object::ActiveObject;
pub use self::builder::{ActiveObjectBuilder, BuildError, DEFAULT_NAME, DEFAULT_POLL_INTERVAL};
pub use self::status::{ActiveObjectStats, Status};
