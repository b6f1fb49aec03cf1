//! Background runner: an engine hosted outside the foreground runtime

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use super::timer_engine::{EngineOptions, TimerEngine};
use crate::error::AppError;
use crate::services::TimerCue;
use crate::state::TimerStatus;

/// Where a background runner executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerContext {
    /// Its own single-worker runtime that outlives foreground stalls.
    Dedicated,
    /// The runtime of the caller.
    Current,
}

/// A timer engine that keeps counting regardless of the foreground.
///
/// The status stream is always readable; control operations are only
/// routable while the runner is reachable (attached).
pub struct BackgroundRunner {
    engine: TimerEngine,
    reachable_tx: watch::Sender<bool>,
    runtime: Option<Runtime>,
}

impl BackgroundRunner {
    pub fn spawn(options: EngineOptions, context: RunnerContext) -> Result<Self, AppError> {
        let (reachable_tx, _) = watch::channel(false);
        Self::spawn_with_reachability(options, context, reachable_tx)
    }

    /// Spawn with a reachability channel created by the caller, so collaborators
    /// built before the runner can already observe it.
    pub fn spawn_with_reachability(
        options: EngineOptions,
        context: RunnerContext,
        reachable_tx: watch::Sender<bool>,
    ) -> Result<Self, AppError> {
        match context {
            RunnerContext::Dedicated => {
                let runtime = Builder::new_multi_thread()
                    .worker_threads(1)
                    .thread_name("background-runner")
                    .enable_all()
                    .build()?;
                let engine = TimerEngine::spawn_on(options, runtime.handle());
                info!("Background runner started on dedicated runtime");
                Ok(Self {
                    engine,
                    reachable_tx,
                    runtime: Some(runtime),
                })
            }
            RunnerContext::Current => {
                let engine = TimerEngine::spawn_on(options, &Handle::current());
                Ok(Self {
                    engine,
                    reachable_tx,
                    runtime: None,
                })
            }
        }
    }

    /// Mark the runner as bound by the foreground.
    pub fn attach(&self) {
        self.set_reachable(true);
    }

    /// Mark the runner as unbound; its engine keeps running.
    pub fn detach(&self) {
        self.set_reachable(false);
    }

    fn set_reachable(&self, reachable: bool) {
        let changed = self.reachable_tx.send_if_modified(|current| {
            let changed = *current != reachable;
            *current = reachable;
            changed
        });
        if changed {
            debug!("Background runner reachable: {}", reachable);
        }
    }

    pub fn is_reachable(&self) -> bool {
        *self.reachable_tx.borrow()
    }

    pub fn subscribe_reachability(&self) -> watch::Receiver<bool> {
        self.reachable_tx.subscribe()
    }

    /// The engine for control operations, if currently reachable.
    pub fn engine(&self) -> Result<&TimerEngine, AppError> {
        if self.is_reachable() {
            Ok(&self.engine)
        } else {
            Err(AppError::BackgroundUnreachable)
        }
    }

    pub fn status(&self) -> TimerStatus {
        self.engine.status()
    }

    pub fn subscribe(&self) -> watch::Receiver<TimerStatus> {
        self.engine.subscribe()
    }

    pub fn subscribe_cues(&self) -> broadcast::Receiver<TimerCue> {
        self.engine.subscribe_cues()
    }
}

impl Drop for BackgroundRunner {
    fn drop(&mut self) {
        // Safe to call from inside another runtime, unlike dropping it.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
            info!("Background runner runtime shut down");
        }
    }
}
