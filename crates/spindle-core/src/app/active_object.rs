//! ActiveObject - コマンドを 1 本の worker で直列実行するハンドル
//!
//! # 保証
//! - 同時に実行されるコマンドは高々 1 つ
//! - 受理された順（FIFO）に実行される
//! - `execute_async` はコマンドの実行前に返る
//!   （`create` の rendezvous キューでは worker が受け取った時点で返る）
//! - close 後の投入は `ActiveObjectError::Closed` で即座に失敗する（hang しない）
//!
//! # 共有状態
//! 呼び出し側と worker が共有するのはコマンドキュー（mpsc）、lifecycle（watch）、
//! 統計カウンタ（atomic）だけ。ロックは使わない。

use std::fmt;
use std::sync::Arc;

use tokio::sync::{oneshot, watch};
use tracing::{error, info, warn};

use crate::app::builder::{ActiveObjectBuilder, BuildError};
use crate::app::status::{StatsCounters, Status};
use crate::domain::{
    ActiveObjectError, ActiveObjectId, Command, CommandError, CommandResult, Lifecycle,
};
use crate::impls::mailbox::{CommandTx, SendError};
use crate::ports::Probe;

/// State shared between every handle clone and the worker.
pub(crate) struct Shared {
    pub(crate) id: ActiveObjectId,
    pub(crate) name: String,
    pub(crate) state: watch::Sender<Lifecycle>,
    pub(crate) stats: StatsCounters,
}

/// Handle to an active object.
///
/// Cloning is cheap; all clones feed the same worker. When the last handle is
/// dropped the queue closes and the worker stops after running what is left.
#[derive(Clone)]
pub struct ActiveObject {
    tx: CommandTx,
    shared: Arc<Shared>,
}

impl ActiveObject {
    /// Start an active object without a queue buffer: each submission waits
    /// until the worker is ready to take it.
    ///
    /// Passing a probe selects polling mode.
    pub fn create(probe: Option<Box<dyn Probe>>) -> Result<Self, BuildError> {
        ActiveObjectBuilder::new()
            .rendezvous()
            .boxed_probe(probe)
            .spawn()
    }

    /// Start an active object whose queue holds at most `capacity` pending
    /// commands (0 = unbounded).
    pub fn create_with_capacity(
        probe: Option<Box<dyn Probe>>,
        capacity: usize,
    ) -> Result<Self, BuildError> {
        ActiveObjectBuilder::new()
            .capacity(capacity)
            .boxed_probe(probe)
            .spawn()
    }

    pub fn builder() -> ActiveObjectBuilder {
        ActiveObjectBuilder::new()
    }

    pub(crate) fn from_parts(tx: CommandTx, shared: Arc<Shared>) -> Self {
        Self { tx, shared }
    }

    pub fn id(&self) -> ActiveObjectId {
        self.shared.id
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Queue bound, `None` when unbounded and `Some(0)` for a rendezvous.
    pub fn capacity(&self) -> Option<usize> {
        self.tx.max_capacity()
    }

    pub fn state(&self) -> Lifecycle {
        *self.shared.state.borrow()
    }

    pub fn status(&self) -> Status {
        Status {
            id: self.shared.id,
            name: self.shared.name.clone(),
            state: self.state(),
            stats: self.shared.stats.snapshot(),
        }
    }

    /// Enqueue a command and return without waiting for it to run.
    ///
    /// Waits while a bounded queue is full, or until the worker takes the
    /// command on a rendezvous queue. A failure inside the command
    /// is fatal to the worker; use [`execute_sync`](Self::execute_sync) to
    /// observe it instead.
    pub async fn execute_async(
        &self,
        command: impl Into<Command>,
    ) -> Result<(), ActiveObjectError> {
        let command = command.into();
        self.ensure_accepting()?;
        let sent = self.tx.send(command).await;
        self.admitted(sent)
    }

    /// Enqueue a command and wait until it has run.
    ///
    /// A failure (returned error or panic) comes back as
    /// `ActiveObjectError::Command`; the worker keeps running.
    pub async fn execute_sync(
        &self,
        command: impl Into<Command>,
    ) -> Result<(), ActiveObjectError> {
        let (command, reply) = self.supervise(command.into());
        self.execute_async(command).await?;
        self.settle(reply.await)
    }

    /// `execute_async` for threads outside the tokio runtime.
    ///
    /// Fails with `AsyncContext` on a thread that carries a tokio runtime
    /// context (runtime workers, `block_on`, `spawn_blocking`).
    pub fn blocking_execute_async(
        &self,
        command: impl Into<Command>,
    ) -> Result<(), ActiveObjectError> {
        let command = command.into();
        self.ensure_outside_runtime()?;
        self.ensure_accepting()?;
        let sent = self.tx.blocking_send(command);
        self.admitted(sent)
    }

    /// `execute_sync` for threads outside the tokio runtime.
    ///
    /// Fails with `AsyncContext` under the same conditions as
    /// [`blocking_execute_async`](Self::blocking_execute_async).
    pub fn blocking_execute_sync(
        &self,
        command: impl Into<Command>,
    ) -> Result<(), ActiveObjectError> {
        self.ensure_outside_runtime()?;
        let (command, reply) = self.supervise(command.into());
        self.blocking_execute_async(command)?;
        self.settle(reply.blocking_recv())
    }

    /// Ask the worker to stop without waiting for it.
    ///
    /// Returns `true` if this call started the shutdown. Safe to call from
    /// inside a command.
    pub fn request_stop(&self) -> bool {
        let started = self.shared.state.send_if_modified(|state| {
            if state.is_accepting() {
                *state = Lifecycle::Stopping;
                true
            } else {
                false
            }
        });
        if started {
            info!(active_object = %self.shared.name, id = %self.shared.id, "stop requested");
        }
        started
    }

    /// Stop the active object and wait for the worker to exit.
    ///
    /// Commands accepted before the stop still run; later submissions fail
    /// with `Closed`. Calling it again is a no-op.
    pub async fn destroy(&self) {
        self.request_stop();
        let mut state = self.shared.state.subscribe();
        // `self` keeps the sender alive, so `wait_for` cannot fail
        let _ = state.wait_for(|state| state.is_terminal()).await;
    }

    fn ensure_accepting(&self) -> Result<(), ActiveObjectError> {
        if self.state().is_accepting() {
            Ok(())
        } else {
            Err(self.rejected())
        }
    }

    fn ensure_outside_runtime(&self) -> Result<(), ActiveObjectError> {
        match tokio::runtime::Handle::try_current() {
            Ok(_) => Err(ActiveObjectError::AsyncContext {
                name: self.shared.name.clone(),
            }),
            Err(_) => Ok(()),
        }
    }

    fn admitted(&self, sent: Result<(), SendError>) -> Result<(), ActiveObjectError> {
        match sent {
            Ok(()) => {
                self.shared.stats.record_submitted();
                Ok(())
            }
            Err(SendError::Closed(_)) => Err(self.rejected()),
            Err(SendError::Dropped) => Err(ActiveObjectError::Dropped {
                name: self.shared.name.clone(),
            }),
        }
    }

    fn rejected(&self) -> ActiveObjectError {
        self.shared.stats.record_rejected();
        ActiveObjectError::Closed {
            name: self.shared.name.clone(),
        }
    }

    /// Wrap `command` so its outcome travels back over a oneshot rendezvous.
    fn supervise(&self, command: Command) -> (Command, oneshot::Receiver<CommandResult>) {
        let (reply_tx, reply_rx) = oneshot::channel();
        let shared = Arc::clone(&self.shared);
        let label = command.label().map(str::to_owned);
        let command = command.supervise(move |result| {
            if let Err(err) = &result {
                shared.stats.record_sync_failure();
                log_sync_failure(&shared, label.as_deref(), err);
            }
            if reply_tx.send(result).is_err() {
                warn!(
                    active_object = %shared.name,
                    "sync caller went away before its result was delivered"
                );
            }
        });
        (command, reply_rx)
    }

    fn settle(
        &self,
        reply: Result<CommandResult, oneshot::error::RecvError>,
    ) -> Result<(), ActiveObjectError> {
        match reply {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(ActiveObjectError::Command {
                name: self.shared.name.clone(),
                source,
            }),
            Err(_) => Err(ActiveObjectError::Dropped {
                name: self.shared.name.clone(),
            }),
        }
    }
}

/// The failure is handed back to the caller; this only leaves a trace of it.
fn log_sync_failure(shared: &Shared, label: Option<&str>, err: &CommandError) {
    let command = label.unwrap_or("-");
    match err.panic_site() {
        Some(site) => error!(
            active_object = %shared.name,
            id = %shared.id,
            command,
            error = %err,
            location = site.location.as_deref().unwrap_or("unknown"),
            backtrace = %site.backtrace,
            "sync command panicked; returning the failure to the caller"
        ),
        None => warn!(
            active_object = %shared.name,
            id = %shared.id,
            command,
            error = %err,
            "sync command failed; returning the failure to the caller"
        ),
    }
}

impl fmt::Debug for ActiveObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveObject")
            .field("id", &self.shared.id)
            .field("name", &self.shared.name)
            .field("state", &self.state())
            .finish()
    }
}
