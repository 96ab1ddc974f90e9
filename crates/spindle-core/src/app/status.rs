//! Status - active object の観測用スナップショット

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::domain::{ActiveObjectId, Lifecycle};

/// Counters since the active object was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveObjectStats {
    /// Commands accepted into the queue.
    pub submitted: u64,
    /// Submissions refused because the active object was closed.
    pub rejected: u64,
    /// Commands the worker has run (including failed ones).
    pub executed: u64,
    /// `execute_sync` commands that failed and were handed back to the caller.
    pub sync_failures: u64,
    /// Probe calls that reported work.
    pub busy_polls: u64,
    /// Probe calls that reported no work (each followed by a sleep).
    pub idle_polls: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pub id: ActiveObjectId,
    pub name: String,
    pub state: Lifecycle,
    pub stats: ActiveObjectStats,
}

/// Shared atomic counters; written by callers and the worker, never locked.
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    submitted: AtomicU64,
    rejected: AtomicU64,
    executed: AtomicU64,
    sync_failures: AtomicU64,
    busy_polls: AtomicU64,
    idle_polls: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_executed(&self) {
        self.executed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sync_failure(&self) {
        self.sync_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_poll(&self, found_work: bool) {
        if found_work {
            self.busy_polls.fetch_add(1, Ordering::Relaxed);
        } else {
            self.idle_polls.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn snapshot(&self) -> ActiveObjectStats {
        ActiveObjectStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            sync_failures: self.sync_failures.load(Ordering::Relaxed),
            busy_polls: self.busy_polls.load(Ordering::Relaxed),
            idle_polls: self.idle_polls.load(Ordering::Relaxed),
        }
    }
}
