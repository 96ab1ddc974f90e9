//! Mailbox - コマンドキュー（tokio mpsc の bounded / unbounded / rendezvous を統一）
//!
//! # 学習ポイント
//! - `Unbounded`: 送信側は待たない
//! - `Bounded(n)`: 満杯なら送信側が待つ = backpressure
//! - `Rendezvous`: バッファなし。worker がコマンドを受け取るまで送信側が待つ
//!   （bounded(1) + 受け取り通知の oneshot で表現する）
//! - `close()` 後も受信側はバッファ済みのコマンドを取り出せる（drain）
//! - 送信失敗時はコマンドを呼び出し側に返す（黙って捨てない）

use std::fmt;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};

use crate::domain::Command;

/// How many commands may wait in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QueueBound {
    /// No buffering: a submission completes when the worker takes it.
    Rendezvous,
    Bounded(usize),
    Unbounded,
}

impl QueueBound {
    /// 0 means unbounded.
    pub(crate) fn from_capacity(capacity: usize) -> Self {
        if capacity == 0 {
            QueueBound::Unbounded
        } else {
            QueueBound::Bounded(capacity)
        }
    }
}

impl fmt::Display for QueueBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueBound::Rendezvous => f.write_str("rendezvous"),
            QueueBound::Bounded(capacity) => write!(f, "bounded({capacity})"),
            QueueBound::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// A rendezvous submission waiting for the worker.
#[derive(Debug)]
pub(crate) struct Handoff {
    command: Command,
    taken: oneshot::Sender<()>,
}

impl Handoff {
    fn take(self) -> Command {
        // 送信側が待つのをやめていても、コマンドは実行する
        let _ = self.taken.send(());
        self.command
    }
}

#[derive(Debug)]
pub(crate) enum SendError {
    /// The queue was closed; the command comes back untouched.
    Closed(Command),
    /// The command was queued but the worker stopped without taking it.
    Dropped,
}

pub(crate) fn channel(bound: QueueBound) -> (CommandTx, CommandRx) {
    match bound {
        QueueBound::Rendezvous => {
            let (tx, rx) = mpsc::channel(1);
            (CommandTx::Rendezvous(tx), CommandRx::Rendezvous(rx))
        }
        QueueBound::Bounded(capacity) => {
            let (tx, rx) = mpsc::channel(capacity);
            (CommandTx::Bounded(tx), CommandRx::Bounded(rx))
        }
        QueueBound::Unbounded => {
            let (tx, rx) = mpsc::unbounded_channel();
            (CommandTx::Unbounded(tx), CommandRx::Unbounded(rx))
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum CommandTx {
    Rendezvous(mpsc::Sender<Handoff>),
    Bounded(mpsc::Sender<Command>),
    Unbounded(mpsc::UnboundedSender<Command>),
}

impl CommandTx {
    /// Enqueue, waiting for a free slot if the queue is bounded and full, or
    /// for the worker to take the command if the queue is a rendezvous.
    pub(crate) async fn send(&self, command: Command) -> Result<(), SendError> {
        match self {
            CommandTx::Rendezvous(tx) => {
                let (taken_tx, taken_rx) = oneshot::channel();
                let handoff = Handoff {
                    command,
                    taken: taken_tx,
                };
                tx.send(handoff)
                    .await
                    .map_err(|e| SendError::Closed(e.0.command))?;
                taken_rx.await.map_err(|_| SendError::Dropped)
            }
            CommandTx::Bounded(tx) => tx
                .send(command)
                .await
                .map_err(|e| SendError::Closed(e.0)),
            CommandTx::Unbounded(tx) => tx.send(command).map_err(|e| SendError::Closed(e.0)),
        }
    }

    /// Same as `send`, for callers outside the async runtime.
    pub(crate) fn blocking_send(&self, command: Command) -> Result<(), SendError> {
        match self {
            CommandTx::Rendezvous(tx) => {
                let (taken_tx, taken_rx) = oneshot::channel();
                let handoff = Handoff {
                    command,
                    taken: taken_tx,
                };
                tx.blocking_send(handoff)
                    .map_err(|e| SendError::Closed(e.0.command))?;
                taken_rx.blocking_recv().map_err(|_| SendError::Dropped)
            }
            CommandTx::Bounded(tx) => tx
                .blocking_send(command)
                .map_err(|e| SendError::Closed(e.0)),
            CommandTx::Unbounded(tx) => tx.send(command).map_err(|e| SendError::Closed(e.0)),
        }
    }

    /// `None` for an unbounded queue, `Some(0)` for a rendezvous.
    pub(crate) fn max_capacity(&self) -> Option<usize> {
        match self {
            CommandTx::Rendezvous(_) => Some(0),
            CommandTx::Bounded(tx) => Some(tx.max_capacity()),
            CommandTx::Unbounded(_) => None,
        }
    }
}

#[derive(Debug)]
pub(crate) enum CommandRx {
    Rendezvous(mpsc::Receiver<Handoff>),
    Bounded(mpsc::Receiver<Command>),
    Unbounded(mpsc::UnboundedReceiver<Command>),
}

impl CommandRx {
    /// Next command, or `None` once the queue is closed (or every sender is
    /// gone) and empty.
    pub(crate) async fn recv(&mut self) -> Option<Command> {
        match self {
            CommandRx::Rendezvous(rx) => rx.recv().await.map(Handoff::take),
            CommandRx::Bounded(rx) => rx.recv().await,
            CommandRx::Unbounded(rx) => rx.recv().await,
        }
    }

    pub(crate) fn try_recv(&mut self) -> Result<Command, TryRecvError> {
        match self {
            CommandRx::Rendezvous(rx) => rx.try_recv().map(Handoff::take),
            CommandRx::Bounded(rx) => rx.try_recv(),
            CommandRx::Unbounded(rx) => rx.try_recv(),
        }
    }

    /// Reject further sends; buffered commands stay receivable.
    pub(crate) fn close(&mut self) {
        match self {
            CommandRx::Rendezvous(rx) => rx.close(),
            CommandRx::Bounded(rx) => rx.close(),
            CommandRx::Unbounded(rx) => rx.close(),
        }
    }
}
