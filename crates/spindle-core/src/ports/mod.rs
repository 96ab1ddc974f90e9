//! Ports - 抽象化レイヤー
//!
//! active object が外部に依存する点（時刻、ID 生成、polling の作業源、
//! 致命的失敗の扱い）を trait として切り出し、テストで差し替えられるようにします。

pub mod clock;
pub mod fatal;
pub mod id_generator;
pub mod probe;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::fatal::{AbortOnFatal, FailureOrigin, FatalFailure, FatalHandler};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::probe::Probe;
