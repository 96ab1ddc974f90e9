//! Errors - コマンド実行と投入のエラー型
//!
//! # 分類
//! - **CommandError**: コマンド自身の失敗（Err を返した / panic した）
//! - **ActiveObjectError**: 投入側から見える失敗（closed, 同期コマンドの失敗, 結果の喪失）

use std::any::Any;

use thiserror::Error;

/// Boxed error returned by a command body.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// CommandError はコマンド 1 件の実行結果としての失敗
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command returned `Err`.
    #[error("{0}")]
    Failed(BoxError),

    /// The command panicked while running on the worker.
    #[error("command panicked: {message}")]
    Panicked {
        message: String,
        /// Where the panic was raised, when it could be recorded.
        site: Option<PanicSite>,
    },
}

/// Location and call stack recorded at the moment of a panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanicSite {
    /// `file:line:column` of the `panic!`.
    pub location: Option<String>,
    /// Rendered backtrace, captured before unwinding started.
    pub backtrace: String,
}

impl CommandError {
    /// Build a `Panicked` error from a `catch_unwind` payload.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>, site: Option<PanicSite>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked { message, site }
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, CommandError::Panicked { .. })
    }

    pub fn panic_site(&self) -> Option<&PanicSite> {
        match self {
            CommandError::Panicked { site, .. } => site.as_ref(),
            CommandError::Failed(_) => None,
        }
    }
}

/// ActiveObjectError は投入 API が返すエラー
#[derive(Debug, Error)]
pub enum ActiveObjectError {
    /// The active object is stopping or stopped; the command was not accepted.
    #[error("active object `{name}` is closed")]
    Closed { name: String },

    /// A command submitted through `execute_sync` failed on the worker.
    #[error("command on active object `{name}` failed: {source}")]
    Command {
        name: String,
        #[source]
        source: CommandError,
    },

    /// The command was accepted but the worker stopped before running it.
    #[error("active object `{name}` stopped before the command completed")]
    Dropped { name: String },

    /// A `blocking_*` method was called on a thread inside a tokio runtime.
    #[error("blocking submission to active object `{name}` from within a tokio runtime")]
    AsyncContext { name: String },
}

impl ActiveObjectError {
    /// The command's own failure, if this error carries one.
    pub fn command_error(&self) -> Option<&CommandError> {
        match self {
            ActiveObjectError::Command { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, ActiveObjectError::Closed { .. })
    }
}
