//! Status reconciliation between the fallback engine and the background runner

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::Level;

use super::background::{BackgroundRunner, RunnerContext};
use super::machine::{SessionLabel, Transition};
use super::timer_engine::{EngineOptions, TimerEngine, DEFAULT_TICK_INTERVAL};
use crate::error::AppError;
use crate::services::{
    Diagnostics, SessionRecord, SessionRecorder, TimerCue, TracingDiagnostics, CUE_CHANNEL_CAPACITY,
};
use crate::state::{TimerConfig, TimerStatus};
use crate::tasks::{connectivity_debounce_task, cue_merge_task, status_merge_task};

pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);

const CATEGORY: &str = "reconciler";

/// Which engine the merged stream currently mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusSource {
    Background,
    Fallback,
}

impl StatusSource {
    pub fn from_reachable(reachable: bool) -> Self {
        if reachable {
            StatusSource::Background
        } else {
            StatusSource::Fallback
        }
    }
}

/// Pick the authoritative snapshot.
pub fn select_status<'a>(
    source: StatusSource,
    background: &'a TimerStatus,
    fallback: &'a TimerStatus,
) -> &'a TimerStatus {
    match source {
        StatusSource::Background => background,
        StatusSource::Fallback => fallback,
    }
}

/// Passes records through only while its engine is the one control
/// operations are routed to. Keyed to raw reachability like routing, so a
/// reset issued inside the debounce window is recorded by the engine that
/// performed it.
struct GatedRecorder {
    source: StatusSource,
    reachable_rx: watch::Receiver<bool>,
    inner: Arc<dyn SessionRecorder>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl SessionRecorder for GatedRecorder {
    fn record(&self, record: SessionRecord) {
        if StatusSource::from_reachable(*self.reachable_rx.borrow()) == self.source {
            self.inner.record(record);
        } else {
            self.diagnostics.log(
                Level::DEBUG,
                CATEGORY,
                &format!("dropping session record from inactive {:?} engine", self.source),
            );
        }
    }
}

#[derive(Clone)]
pub struct ReconcilerSettings {
    pub config: TimerConfig,
    pub tick_interval: Duration,
    pub debounce_window: Duration,
    pub runner_context: RunnerContext,
    pub recorder: Arc<dyn SessionRecorder>,
    pub diagnostics: Arc<dyn Diagnostics>,
}

impl ReconcilerSettings {
    pub fn new(config: TimerConfig, recorder: Arc<dyn SessionRecorder>) -> Self {
        Self {
            config,
            tick_interval: DEFAULT_TICK_INTERVAL,
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
            runner_context: RunnerContext::Dedicated,
            recorder,
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }
}

/// One status stream over two independently ticking engines.
///
/// Reads follow the debounced selection; control operations follow the
/// runner's reachability at the moment of the call.
pub struct StatusReconciler {
    background: BackgroundRunner,
    fallback: TimerEngine,
    selected_rx: watch::Receiver<StatusSource>,
    merged_rx: watch::Receiver<TimerStatus>,
    cue_tx: broadcast::Sender<TimerCue>,
    diagnostics: Arc<dyn Diagnostics>,
    tasks: Vec<JoinHandle<()>>,
}

impl StatusReconciler {
    /// Build both engines and start the merge tasks on the current runtime.
    pub fn spawn(settings: ReconcilerSettings) -> Result<Self, AppError> {
        let (reachable_tx, reachable_rx) = watch::channel(false);
        let (selected_tx, selected_rx) = watch::channel(StatusSource::Fallback);

        let gated = |source| -> Arc<dyn SessionRecorder> {
            Arc::new(GatedRecorder {
                source,
                reachable_rx: reachable_rx.clone(),
                inner: Arc::clone(&settings.recorder),
                diagnostics: Arc::clone(&settings.diagnostics),
            })
        };
        let options = |name| {
            EngineOptions::new(name, settings.config)
                .with_tick_interval(settings.tick_interval)
                .with_diagnostics(Arc::clone(&settings.diagnostics))
        };

        let background = BackgroundRunner::spawn_with_reachability(
            options("background").with_recorder(gated(StatusSource::Background)),
            settings.runner_context,
            reachable_tx,
        )?;
        let fallback = TimerEngine::spawn(
            options("fallback").with_recorder(gated(StatusSource::Fallback)),
        );

        selected_tx.send_replace(StatusSource::from_reachable(*reachable_rx.borrow()));

        let (merged_tx, merged_rx) = watch::channel(
            select_status(*selected_rx.borrow(), &background.status(), &fallback.status()).clone(),
        );
        let (cue_tx, _) = broadcast::channel(CUE_CHANNEL_CAPACITY);

        let tasks = vec![
            tokio::spawn(connectivity_debounce_task(
                reachable_rx,
                selected_tx,
                settings.debounce_window,
            )),
            tokio::spawn(status_merge_task(
                background.subscribe(),
                fallback.subscribe(),
                selected_rx.clone(),
                merged_tx,
            )),
            tokio::spawn(cue_merge_task(
                background.subscribe_cues(),
                fallback.subscribe_cues(),
                selected_rx.clone(),
                cue_tx.clone(),
                Arc::clone(&settings.diagnostics),
            )),
        ];

        Ok(Self {
            background,
            fallback,
            selected_rx,
            merged_rx,
            cue_tx,
            diagnostics: settings.diagnostics,
            tasks,
        })
    }

    /// Current snapshot of the selected source, read straight from the
    /// engines so it already reflects a control operation that just returned.
    pub fn status(&self) -> TimerStatus {
        select_status(self.source(), &self.background.status(), &self.fallback.status()).clone()
    }

    /// The merged stream. It follows the engines asynchronously.
    pub fn subscribe(&self) -> watch::Receiver<TimerStatus> {
        self.merged_rx.clone()
    }

    pub fn subscribe_cues(&self) -> broadcast::Receiver<TimerCue> {
        self.cue_tx.subscribe()
    }

    /// Source currently mirrored by the merged stream.
    pub fn source(&self) -> StatusSource {
        *self.selected_rx.borrow()
    }

    pub fn config(&self) -> TimerConfig {
        self.status().config
    }

    pub fn background(&self) -> &BackgroundRunner {
        &self.background
    }

    pub fn fallback(&self) -> &TimerEngine {
        &self.fallback
    }

    pub fn start(&self, config: TimerConfig, label: SessionLabel) -> Result<Transition, AppError> {
        self.mirrored("start", |engine| engine.start(config, label.clone()))
    }

    pub fn pause(&self) -> Result<Transition, AppError> {
        self.route().pause()
    }

    pub fn resume(&self) -> Result<Transition, AppError> {
        self.route().resume()
    }

    pub fn reset(&self) -> Result<Transition, AppError> {
        self.mirrored("reset", TimerEngine::reset)
    }

    pub fn update_config(&self, config: TimerConfig) -> Result<Transition, AppError> {
        self.route().update_config(config)
    }

    /// The single engine a control operation goes to.
    fn route(&self) -> &TimerEngine {
        match self.background.engine() {
            Ok(engine) => engine,
            Err(err) => {
                self.diagnostics.log(
                    Level::DEBUG,
                    CATEGORY,
                    &format!("{err} ({:?}), routing to fallback", err.recovery()),
                );
                &self.fallback
            }
        }
    }

    /// Run on the routed engine and, when that is the background runner,
    /// repeat on the fallback so it holds a matching session if the runner
    /// goes away.
    fn mirrored<F>(&self, operation: &str, op: F) -> Result<Transition, AppError>
    where
        F: Fn(&TimerEngine) -> Result<Transition, AppError>,
    {
        let primary = self.route();
        let transition = op(primary)?;

        if !std::ptr::eq(primary, &self.fallback) {
            match op(&self.fallback) {
                Ok(mirror) if mirror != transition => self.diagnostics.log(
                    Level::WARN,
                    CATEGORY,
                    &format!("{operation} mirrored to fallback as {mirror:?}, background {transition:?}"),
                ),
                Ok(_) => {}
                Err(err) => self.diagnostics.log(
                    Level::WARN,
                    CATEGORY,
                    &format!("{operation} mirror to fallback failed: {err}"),
                ),
            }
        }
        Ok(transition)
    }
}

impl Drop for StatusReconciler {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
