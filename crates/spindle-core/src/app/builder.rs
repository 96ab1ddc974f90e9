//! ActiveObjectBuilder - active object の構築と worker の起動
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）: 不正な設定は worker を起動する前に BuildError にする

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::info;

use crate::app::active_object::{ActiveObject, Shared};
use crate::app::status::StatsCounters;
use crate::app::worker_loop::WorkerLoop;
use crate::domain::Lifecycle;
use crate::impls::mailbox::{self, QueueBound};
use crate::ports::{AbortOnFatal, FatalHandler, IdGenerator, Probe, SystemClock, UlidGenerator};

pub const DEFAULT_NAME: &str = "active-object";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// BuildError は active object 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,

    #[error("no tokio runtime is available to spawn the worker")]
    NoRuntime,
}

/// ActiveObjectBuilder は active object を構築して worker を起動する
///
/// # 使用例
/// ```ignore
/// let ao = ActiveObject::builder()
///     .name("ring-drainer")
///     .capacity(64)
///     .probe(move || ring.drain_one())
///     .poll_interval(Duration::from_millis(5))
///     .spawn()?;
/// ```
pub struct ActiveObjectBuilder {
    name: String,
    queue: QueueBound,
    probe: Option<Box<dyn Probe>>,
    poll_interval: Duration,
    id_generator: Option<Box<dyn IdGenerator>>,
    fatal_handler: Arc<dyn FatalHandler>,
}

impl ActiveObjectBuilder {
    pub fn new() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            queue: QueueBound::Unbounded,
            probe: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            id_generator: None,
            fatal_handler: Arc::new(AbortOnFatal),
        }
    }

    /// Name used in logs and errors.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Maximum number of pending commands; 0 means unbounded.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.queue = QueueBound::from_capacity(capacity);
        self
    }

    /// No buffering: each submission waits until the worker takes it.
    pub fn rendezvous(mut self) -> Self {
        self.queue = QueueBound::Rendezvous;
        self
    }

    /// Switch the worker to polling mode with this probe.
    pub fn probe(mut self, probe: impl Probe + 'static) -> Self {
        self.probe = Some(Box::new(probe));
        self
    }

    pub(crate) fn boxed_probe(mut self, probe: Option<Box<dyn Probe>>) -> Self {
        self.probe = probe;
        self
    }

    /// Sleep between probe calls that found no work.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Seed the id generator so the instance id is reproducible.
    pub fn id_seed(self, seed: u64) -> Self {
        self.id_generator(UlidGenerator::seeded(SystemClock, seed))
    }

    pub fn id_generator(mut self, id_generator: impl IdGenerator + 'static) -> Self {
        self.id_generator = Some(Box::new(id_generator));
        self
    }

    pub fn fatal_handler(mut self, handler: impl FatalHandler + 'static) -> Self {
        self.fatal_handler = Arc::new(handler);
        self
    }

    /// Validate the configuration and start the worker on the current tokio runtime.
    pub fn spawn(self) -> Result<ActiveObject, BuildError> {
        if self.poll_interval.is_zero() {
            return Err(BuildError::ZeroPollInterval);
        }
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| BuildError::NoRuntime)?;

        let mut id_generator = self
            .id_generator
            .unwrap_or_else(|| -> Box<dyn IdGenerator> {
                Box::new(UlidGenerator::from_entropy(SystemClock))
            });
        let id = id_generator.generate_active_object_id();

        let (tx, rx) = mailbox::channel(self.queue);
        let (state, _) = watch::channel(Lifecycle::Created);
        let shared = Arc::new(Shared {
            id,
            name: self.name,
            state,
            stats: StatsCounters::default(),
        });

        let polling = self.probe.is_some();
        let worker = WorkerLoop::new(
            Arc::clone(&shared),
            rx,
            self.probe,
            self.poll_interval,
            self.fatal_handler,
        );
        shared.state.send_replace(Lifecycle::Running);
        runtime.spawn(worker.run());

        info!(
            active_object = %shared.name,
            id = %shared.id,
            queue = %self.queue,
            polling,
            "active object started"
        );
        Ok(ActiveObject::from_parts(tx, shared))
    }
}

impl Default for ActiveObjectBuilder {
    fn default() -> Self {
        Self::new()
    }
}
