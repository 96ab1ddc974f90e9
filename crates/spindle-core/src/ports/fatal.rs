//! FatalHandler port - 監視されていない失敗の最終処理
//!
//! `execute_async` で投入されたコマンド（または probe）が失敗した場合、
//! worker はログを出したあと `FatalHandler` を呼びます。
//! 既定の `AbortOnFatal` はプロセスを abort します。

use std::fmt;

use crate::domain::{ActiveObjectId, CommandSeq};

/// Where an unsupervised failure came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureOrigin {
    Command {
        seq: CommandSeq,
        label: Option<String>,
    },
    Probe,
}

impl fmt::Display for FailureOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureOrigin::Command {
                seq,
                label: Some(label),
            } => write!(f, "{seq} ({label})"),
            FailureOrigin::Command { seq, label: None } => write!(f, "{seq}"),
            FailureOrigin::Probe => f.write_str("probe"),
        }
    }
}

/// Full diagnostic context of a fatal failure.
#[derive(Debug, Clone)]
pub struct FatalFailure {
    pub active_object: String,
    pub id: ActiveObjectId,
    pub origin: FailureOrigin,
    pub error: String,
    /// `file:line:column` of the panic; `None` for a returned `Err`.
    pub location: Option<String>,
    /// Call stack at the point of failure.
    pub backtrace: String,
}

pub trait FatalHandler: Send + Sync {
    /// Called on the worker after the failure has been logged.
    ///
    /// If this returns, the worker stops and drops whatever is still queued.
    fn on_fatal(&self, failure: &FatalFailure);
}

/// Terminates the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbortOnFatal;

impl FatalHandler for AbortOnFatal {
    fn on_fatal(&self, _failure: &FatalFailure) {
        std::process::abort();
    }
}
