//! Lifecycle state machine of an active object.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of an active object.
///
/// State transitions:
/// - Created -> Running (worker spawned)
/// - Running -> Stopping (destroy / request_stop)
/// - Stopping -> Stopped (accepted commands drained, worker exited)
/// - Running -> Stopped (fatal failure, or every handle dropped)
///
/// Stopped is terminal. There is no transition back to Running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Built, worker not yet spawned.
    Created,

    /// Accepting and executing commands.
    Running,

    /// Stop requested; no new commands accepted, queued ones still run.
    Stopping,

    /// Worker exited.
    Stopped,
}

impl Lifecycle {
    /// Can new commands be submitted?
    pub fn is_accepting(self) -> bool {
        matches!(self, Lifecycle::Created | Lifecycle::Running)
    }

    /// Has a stop been requested (or already completed)?
    pub fn is_stopping(self) -> bool {
        matches!(self, Lifecycle::Stopping | Lifecycle::Stopped)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Lifecycle::Stopped)
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Lifecycle::Created => "created",
            Lifecycle::Running => "running",
            Lifecycle::Stopping => "stopping",
            Lifecycle::Stopped => "stopped",
        };
        f.write_str(s)
    }
}
