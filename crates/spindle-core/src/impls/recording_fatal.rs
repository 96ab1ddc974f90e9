//! RecordingFatalHandler - テスト・開発用の FatalHandler
//!
//! プロセスを abort せず、失敗を記録するだけ。worker はその後停止します。

use std::sync::Arc;

use tokio::sync::watch;

use crate::ports::{FatalFailure, FatalHandler};

#[derive(Debug, Clone)]
pub struct RecordingFatalHandler {
    failures: Arc<watch::Sender<Vec<FatalFailure>>>,
}

impl RecordingFatalHandler {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        Self {
            failures: Arc::new(tx),
        }
    }

    pub fn failures(&self) -> Vec<FatalFailure> {
        self.failures.borrow().clone()
    }

    /// Wait until at least one failure has been recorded and return the first.
    pub async fn first_failure(&self) -> FatalFailure {
        let mut rx = self.failures.subscribe();
        // `self` keeps the sender alive, so `wait_for` cannot fail
        let _ = rx.wait_for(|failures| !failures.is_empty()).await;
        rx.borrow()[0].clone()
    }
}

impl Default for RecordingFatalHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl FatalHandler for RecordingFatalHandler {
    fn on_fatal(&self, failure: &FatalFailure) {
        self.failures.send_modify(|failures| failures.push(failure.clone()));
    }
}
