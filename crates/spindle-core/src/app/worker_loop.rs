//! WorkerLoop - active object の唯一の worker
//!
//! # フロー
//! - default mode: stop シグナル or 次のコマンドを待つ（busy-wait しない）
//! - polling mode: stop を確認 → コマンドがあれば実行（優先）→ なければ probe
//!   probe が false なら poll_interval だけ sleep
//! - stop 要求後: キューを close し、受理済みのコマンドを実行してから終了
//! - 監視されていない失敗: ログ → FatalHandler → 即停止

use std::backtrace::Backtrace;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::app::active_object::Shared;
use crate::domain::{Command, CommandError, CommandSeq, Lifecycle, unwind};
use crate::impls::mailbox::CommandRx;
use crate::ports::{FailureOrigin, FatalFailure, FatalHandler, Probe};

/// Why the main loop returned.
enum Exit {
    StopRequested,
    /// Every handle was dropped and the queue is empty.
    Disconnected,
    Fatal,
}

pub(crate) struct WorkerLoop {
    shared: Arc<Shared>,
    commands: CommandRx,
    stop_rx: watch::Receiver<Lifecycle>,
    probe: Option<Box<dyn Probe>>,
    poll_interval: Duration,
    fatal_handler: Arc<dyn FatalHandler>,
    executed: u64,
    // 最後に drop させる: キューが閉じてから Stopped になる
    _stopped: MarkStoppedOnDrop,
}

impl WorkerLoop {
    pub(crate) fn new(
        shared: Arc<Shared>,
        commands: CommandRx,
        probe: Option<Box<dyn Probe>>,
        poll_interval: Duration,
        fatal_handler: Arc<dyn FatalHandler>,
    ) -> Self {
        let stop_rx = shared.state.subscribe();
        // 一度も poll されずに runtime ごと drop されても Stopped にする
        let stopped = MarkStoppedOnDrop(Arc::clone(&shared));
        Self {
            shared,
            commands,
            stop_rx,
            probe,
            poll_interval,
            fatal_handler,
            executed: 0,
            _stopped: stopped,
        }
    }

    pub(crate) async fn run(mut self) {
        let exit = match self.probe.take() {
            None => self.run_default().await,
            Some(probe) => self.run_polling(probe).await,
        };

        match exit {
            Exit::StopRequested => self.drain().await,
            Exit::Disconnected => {}
            Exit::Fatal => self.commands.close(),
        }

        info!(
            active_object = %self.shared.name,
            id = %self.shared.id,
            executed = self.executed,
            "active object stopped"
        );
    }

    async fn run_default(&mut self) -> Exit {
        loop {
            let next = tokio::select! {
                biased;
                _ = stop_requested(&mut self.stop_rx) => return Exit::StopRequested,
                command = self.commands.recv() => command,
            };
            let Some(command) = next else {
                return Exit::Disconnected;
            };
            if self.execute(command).is_break() {
                return Exit::Fatal;
            }
        }
    }

    async fn run_polling(&mut self, mut probe: Box<dyn Probe>) -> Exit {
        loop {
            if self.stop_rx.borrow().is_stopping() {
                return Exit::StopRequested;
            }

            match self.commands.try_recv() {
                Ok(command) => {
                    if self.execute(command).is_break() {
                        return Exit::Fatal;
                    }
                    // 同じ runtime スレッド上の他タスクを飢えさせない
                    tokio::task::yield_now().await;
                    continue;
                }
                Err(TryRecvError::Disconnected) => return Exit::Disconnected,
                Err(TryRecvError::Empty) => {}
            }

            match poll_probe(probe.as_mut()) {
                Ok(found_work) => {
                    self.shared.stats.record_poll(found_work);
                    if found_work {
                        tokio::task::yield_now().await;
                    } else {
                        tokio::time::sleep(self.poll_interval).await;
                    }
                }
                Err(err) => {
                    self.fatal(FailureOrigin::Probe, &err);
                    return Exit::Fatal;
                }
            }
        }
    }

    /// Close the queue and run what was accepted before the close.
    async fn drain(&mut self) {
        self.commands.close();
        let mut drained = 0_u64;
        while let Some(command) = self.commands.recv().await {
            drained += 1;
            if self.execute(command).is_break() {
                return;
            }
        }
        debug!(
            active_object = %self.shared.name,
            drained,
            "queue drained after stop request"
        );
    }

    fn execute(&mut self, mut command: Command) -> ControlFlow<()> {
        self.executed += 1;
        let seq = CommandSeq::new(self.executed);
        let label = command.take_label();

        let result = command.run();
        self.shared.stats.record_executed();

        match result {
            Ok(()) => ControlFlow::Continue(()),
            Err(err) => {
                let origin = FailureOrigin::Command {
                    seq,
                    label: label.map(|l| l.into_owned()),
                };
                self.fatal(origin, &err);
                ControlFlow::Break(())
            }
        }
    }

    fn fatal(&self, origin: FailureOrigin, err: &CommandError) {
        // panic なら panic 地点のスタック、Err を返した場合はここで取る
        let (location, backtrace) = match err.panic_site() {
            Some(site) => (site.location.clone(), site.backtrace.clone()),
            None => (None, Backtrace::force_capture().to_string()),
        };
        error!(
            active_object = %self.shared.name,
            id = %self.shared.id,
            origin = %origin,
            error = %err,
            location = location.as_deref().unwrap_or("unknown"),
            backtrace = %backtrace,
            "unsupervised failure on active object worker"
        );

        let failure = FatalFailure {
            active_object: self.shared.name.clone(),
            id: self.shared.id,
            origin,
            error: err.to_string(),
            location,
            backtrace,
        };
        self.fatal_handler.on_fatal(&failure);
    }
}

async fn stop_requested(stop_rx: &mut watch::Receiver<Lifecycle>) {
    // sender は Shared が持っているので Err にはならない
    let _ = stop_rx.wait_for(|state| state.is_stopping()).await;
}

fn poll_probe(probe: &mut dyn Probe) -> Result<bool, CommandError> {
    unwind::catch(|| probe.poll())
}

struct MarkStoppedOnDrop(Arc<Shared>);

impl Drop for MarkStoppedOnDrop {
    fn drop(&mut self) {
        self.0.state.send_replace(Lifecycle::Stopped);
    }
}
