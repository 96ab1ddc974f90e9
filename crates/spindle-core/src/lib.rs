//! spindle-core
//!
//! A single-worker active object for tokio: commands submitted from any number
//! of callers run one at a time, in the order they were accepted, on the
//! instance's own worker task.
//!
//! # モジュール構成
//! - **domain**: Command, ids, Lifecycle, errors
//! - **ports**: 抽象化レイヤー（Clock, IdGenerator, Probe, FatalHandler）
//! - **app**: ActiveObject, builder, worker loop, status
//! - **impls**: mailbox（mpsc ラッパー）, RecordingFatalHandler
//!
//! # 使用例
//! ```ignore
//! let ao = ActiveObject::create(None)?;
//! ao.execute_async(move || store.put(key, value)).await?;
//! ao.execute_sync(move || conn.flush()).await?;
//! ao.destroy().await;
//! ```

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;

#[cfg(test)]
mod test_support;

pub use app::{ActiveObject, ActiveObjectBuilder, ActiveObjectStats, BuildError, Status};
pub use domain::{ActiveObjectError, ActiveObjectId, Command, CommandError, Lifecycle, PanicSite};
pub use ports::{FatalHandler, Probe};
