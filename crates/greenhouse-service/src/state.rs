//! Application state shared across handlers.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use greenhouse_core::SensorRegistry;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::Config;

/// Shared application state.
pub struct AppState {
    /// The greenhouse sensors.
    pub registry: SensorRegistry,
    /// Configuration (RwLock for runtime reads from handlers).
    pub config: RwLock<Config>,
    /// Collector control state.
    pub collector: CollectorState,
}

impl AppState {
    /// Create new application state.
    pub fn new(registry: SensorRegistry, config: Config) -> Arc<Self> {
        Arc::new(Self {
            registry,
            config: RwLock::new(config),
            collector: CollectorState::new(),
        })
    }
}

/// State for tracking and controlling the collector.
pub struct CollectorState {
    /// Whether the collector is currently running.
    running: AtomicBool,
    /// When the collector was started (Unix timestamp, 0 when stopped).
    started_at: AtomicI64,
    /// The current run, if any. Starting and stopping swap it under this lock.
    run: Mutex<Option<CollectorRun>>,
}

/// Tasks spawned by one start of the collector, with the token stopping them.
pub struct CollectorRun {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl CollectorRun {
    /// Number of tasks in this run.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether this run spawned no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for this run's tasks to finish.
    ///
    /// Tasks still running after `timeout` are aborted. Returns `true` if
    /// every task finished on its own.
    pub async fn wait(self, timeout: Duration) -> bool {
        let aborts: Vec<_> = self.tasks.iter().map(JoinHandle::abort_handle).collect();
        match tokio::time::timeout(timeout, futures::future::join_all(self.tasks)).await {
            Ok(_) => true,
            Err(_) => {
                warn!(
                    "Collector tasks did not stop within {}s, aborting",
                    timeout.as_secs()
                );
                for abort in aborts {
                    abort.abort();
                }
                false
            }
        }
    }
}

impl CollectorState {
    /// Create a new, stopped collector state.
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            started_at: AtomicI64::new(0),
            run: Mutex::new(None),
        }
    }

    /// Check if the collector is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start a run unless one is active.
    ///
    /// `spawn` receives the new run's cancellation token and returns the
    /// tasks it spawned. It is called while the run lock is held, so a
    /// concurrent stop either sees no run or this complete one. Returns
    /// `false` if the collector was already running.
    pub fn try_start<F>(&self, spawn: F) -> bool
    where
        F: FnOnce(&CancellationToken) -> Vec<JoinHandle<()>>,
    {
        let mut run = self.run.lock().unwrap_or_else(PoisonError::into_inner);
        if run.is_some() {
            return false;
        }

        let cancel = CancellationToken::new();
        let tasks = spawn(&cancel);
        *run = Some(CollectorRun { cancel, tasks });

        let now = OffsetDateTime::now_utc().unix_timestamp();
        self.started_at.store(now, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        true
    }

    /// Get the collector start time.
    pub fn started_at(&self) -> Option<OffsetDateTime> {
        let ts = self.started_at.load(Ordering::SeqCst);
        if ts == 0 {
            None
        } else {
            OffsetDateTime::from_unix_timestamp(ts).ok()
        }
    }

    /// Signal the current run's tasks to stop and detach the run.
    ///
    /// Returns the stopped run for the caller to wait on, or `None` if the
    /// collector was not running. A run started afterwards is independent.
    pub fn signal_stop(&self) -> Option<CollectorRun> {
        let mut run = self.run.lock().unwrap_or_else(PoisonError::into_inner);
        let stopped = run.take()?;

        self.running.store(false, Ordering::SeqCst);
        self.started_at.store(0, Ordering::SeqCst);
        stopped.cancel.cancel();
        Some(stopped)
    }
}

impl Default for CollectorState {
    fn default() -> Self {
        Self::new()
    }
}
