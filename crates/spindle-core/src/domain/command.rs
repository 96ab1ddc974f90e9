//! Command - worker 上で直列に実行される作業単位
//!
//! # 学習ポイント
//! - `FnOnce` を Box に包んだ type erasure
//! - 戻り値の正規化（`()` と `Result<(), E>` を同じ `CommandResult` に寄せる）
//! - panic は `unwind::catch` で発生位置ごと値に変換

use std::borrow::Cow;
use std::fmt;

use super::errors::{BoxError, CommandError};
use super::unwind;

pub type CommandResult = Result<(), CommandError>;

/// CommandOutput は command body の戻り値を `CommandResult` に変換する
///
/// - `()` は常に成功
/// - `Result<(), E>` は `E` を `CommandError::Failed` に包む
pub trait CommandOutput {
    fn into_result(self) -> CommandResult;
}

impl CommandOutput for () {
    fn into_result(self) -> CommandResult {
        Ok(())
    }
}

impl<E> CommandOutput for Result<(), E>
where
    E: Into<BoxError>,
{
    fn into_result(self) -> CommandResult {
        self.map_err(|e| CommandError::Failed(e.into()))
    }
}

type Body = Box<dyn FnOnce() -> CommandResult + Send + 'static>;

/// A unit of work with no arguments and no return value.
///
/// Closures convert into commands directly:
/// ```ignore
/// ao.execute_async(move || counter.fetch_add(1, Ordering::Relaxed)).await?;
/// ao.execute_async(Command::named("flush", move || conn.flush())).await?;
/// ```
pub struct Command {
    label: Option<Cow<'static, str>>,
    body: Body,
}

impl Command {
    pub fn new<F, O>(f: F) -> Self
    where
        F: FnOnce() -> O + Send + 'static,
        O: CommandOutput,
    {
        Self {
            label: None,
            body: Box::new(move || f().into_result()),
        }
    }

    /// Create a command with a label that shows up in diagnostics.
    pub fn named<F, O>(label: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: FnOnce() -> O + Send + 'static,
        O: CommandOutput,
    {
        Self::new(f).with_label(label)
    }

    pub fn with_label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub(crate) fn take_label(&mut self) -> Option<Cow<'static, str>> {
        self.label.take()
    }

    /// Run the body, turning a panic into `CommandError::Panicked`.
    pub(crate) fn run(self) -> CommandResult {
        unwind::catch(self.body).and_then(|result| result)
    }

    /// Wrap this command so its outcome is handed to `report` instead of
    /// surfacing on the worker. The wrapper itself always succeeds.
    pub(crate) fn supervise<R>(self, report: R) -> Command
    where
        R: FnOnce(CommandResult) + Send + 'static,
    {
        let label = self.label.clone();
        Command {
            label,
            body: Box::new(move || {
                report(self.run());
                Ok(())
            }),
        }
    }
}

impl<F, O> From<F> for Command
where
    F: FnOnce() -> O + Send + 'static,
    O: CommandOutput,
{
    fn from(f: F) -> Self {
        Command::new(f)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn unit_closure_succeeds() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);

        let command = Command::from(move || flag.store(true, Ordering::SeqCst));
        assert!(command.run().is_ok());
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn returned_error_is_failed() {
        let command = Command::new(|| Err::<(), _>("disk full"));
        let err = command.run().unwrap_err();

        assert!(matches!(err, CommandError::Failed(_)));
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn panic_is_captured() {
        let command = Command::new(|| -> () { panic!("bad index") });
        let err = command.run().unwrap_err();

        assert!(err.is_panic());
        assert!(err.to_string().contains("bad index"));
        let location = err.panic_site().and_then(|site| site.location.clone());
        assert!(location.unwrap().contains("command.rs"));
    }

    #[test]
    fn labels_survive_supervision() {
        let command = Command::named("flush", || ());
        assert_eq!(command.label(), Some("flush"));

        let supervised = command.supervise(|_| {});
        assert_eq!(supervised.label(), Some("flush"));
        assert_eq!(format!("{supervised:?}"), "Command { label: Some(\"flush\"), .. }");
    }

    #[test]
    fn supervised_failure_is_reported_not_raised() {
        let (tx, rx) = std::sync::mpsc::channel();
        let command = Command::new(|| Err::<(), _>("nope")).supervise(move |result| {
            tx.send(result).unwrap();
        });

        assert!(command.run().is_ok());
        let reported = rx.recv().unwrap();
        assert_eq!(reported.unwrap_err().to_string(), "nope");
    }
}
