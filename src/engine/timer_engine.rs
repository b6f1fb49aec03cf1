//! Async timer engine: one machine, one tick loop, one status channel

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::Level;

use super::machine::{Effects, SessionLabel, TimerMachine, Transition};
use crate::error::AppError;
use crate::services::{
    Diagnostics, NoopRecorder, SessionRecorder, TimerCue, TracingDiagnostics, CUE_CHANNEL_CAPACITY,
};
use crate::state::{TimerConfig, TimerStatus};
use crate::tasks::tick_loop_task;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Construction parameters for a [`TimerEngine`].
#[derive(Clone)]
pub struct EngineOptions {
    pub name: &'static str,
    pub config: TimerConfig,
    pub tick_interval: Duration,
    pub recorder: Arc<dyn SessionRecorder>,
    pub diagnostics: Arc<dyn Diagnostics>,
}

impl EngineOptions {
    pub fn new(name: &'static str, config: TimerConfig) -> Self {
        Self {
            name,
            config,
            tick_interval: DEFAULT_TICK_INTERVAL,
            recorder: Arc::new(NoopRecorder),
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn SessionRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}

/// State shared between an engine handle and its tick loop.
pub struct EngineCore {
    name: &'static str,
    machine: Mutex<TimerMachine>,
    status_tx: watch::Sender<TimerStatus>,
    cue_tx: broadcast::Sender<TimerCue>,
    recorder: Arc<dyn SessionRecorder>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl EngineCore {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn subscribe(&self) -> watch::Receiver<TimerStatus> {
        self.status_tx.subscribe()
    }

    /// Advance the machine and publish. Returns whether it is still ticking.
    pub fn tick(&self, now: Instant) -> bool {
        let Ok(mut machine) = self.machine.lock() else {
            self.log(Level::ERROR, "engine lock poisoned, stopping tick loop");
            return false;
        };

        let effects = machine.tick(now);
        let status = machine.status();
        let ticking = status.state.is_ticking();
        self.status_tx.send_if_modified(|current| {
            if current == status {
                false
            } else {
                *current = status.clone();
                true
            }
        });
        self.dispatch(effects);
        ticking
    }

    fn dispatch(&self, effects: Effects) {
        for cue in effects.cues {
            // No listener is fine; cues are fire-and-forget.
            let _ = self.cue_tx.send(cue);
        }
        if let Some(outcome) = effects.outcome {
            let completed = outcome.completed;
            self.recorder.record(outcome.into_record(Utc::now()));
            self.log(
                Level::INFO,
                if completed { "session completed" } else { "session abandoned" },
            );
        }
    }

    fn log(&self, level: Level, message: &str) {
        self.diagnostics.log(level, self.name, message);
    }
}

/// Owns a machine and the periodic task driving it.
///
/// Dropping the engine aborts its tick loop; a session still in progress is
/// reported to the recorder as abandoned.
pub struct TimerEngine {
    core: Arc<EngineCore>,
    tick_task: JoinHandle<()>,
}

impl TimerEngine {
    /// Spawn on the current tokio runtime.
    pub fn spawn(options: EngineOptions) -> Self {
        Self::spawn_on(options, &Handle::current())
    }

    pub fn spawn_on(options: EngineOptions, handle: &Handle) -> Self {
        let machine = TimerMachine::new(options.config);
        let (status_tx, _) = watch::channel(machine.status().clone());
        let (cue_tx, _) = broadcast::channel(CUE_CHANNEL_CAPACITY);

        let core = Arc::new(EngineCore {
            name: options.name,
            machine: Mutex::new(machine),
            status_tx,
            cue_tx,
            recorder: options.recorder,
            diagnostics: options.diagnostics,
        });
        let tick_task = handle.spawn(tick_loop_task(Arc::clone(&core), options.tick_interval));
        core.log(Level::DEBUG, "engine started");

        Self { core, tick_task }
    }

    pub fn name(&self) -> &'static str {
        self.core.name
    }

    pub fn status(&self) -> TimerStatus {
        self.core.status_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TimerStatus> {
        self.core.subscribe()
    }

    pub fn subscribe_cues(&self) -> broadcast::Receiver<TimerCue> {
        self.core.cue_tx.subscribe()
    }

    pub fn start(&self, config: TimerConfig, label: SessionLabel) -> Result<Transition, AppError> {
        self.apply("start", |machine, now| machine.start(config, label, now))
    }

    pub fn pause(&self) -> Result<Transition, AppError> {
        self.apply("pause", |machine, now| machine.pause(now))
    }

    pub fn resume(&self) -> Result<Transition, AppError> {
        self.apply("resume", |machine, now| machine.resume(now))
    }

    pub fn reset(&self) -> Result<Transition, AppError> {
        self.apply("reset", |machine, _| machine.reset())
    }

    pub fn update_config(&self, config: TimerConfig) -> Result<Transition, AppError> {
        self.apply("update_config", |machine, _| machine.update_config(config))
    }

    /// Run one control operation against a copy of the machine and commit
    /// it only if it applied, so observers never see a half-made transition.
    fn apply<F>(&self, operation: &str, op: F) -> Result<Transition, AppError>
    where
        F: FnOnce(&mut TimerMachine, Instant) -> (Transition, Effects),
    {
        let core = &self.core;
        let mut machine = core.machine.lock().map_err(|e| {
            let err = AppError::EngineUnavailable(format!("{operation} failed: {e}"));
            core.log(Level::ERROR, &err.to_string());
            err
        })?;

        let mut next = machine.clone();
        let (transition, effects) = op(&mut next, Instant::now());

        match transition {
            Transition::Ignored => {
                core.log(
                    Level::WARN,
                    &format!("{operation} ignored in state {}", machine.status().state),
                );
            }
            Transition::Applied => {
                *machine = next;
                core.status_tx.send_replace(machine.status().clone());
                core.log(
                    Level::DEBUG,
                    &format!("{operation} applied, now {}", machine.status().state),
                );
                core.dispatch(effects);
            }
        }
        Ok(transition)
    }
}

impl Drop for TimerEngine {
    fn drop(&mut self) {
        self.tick_task.abort();
        if let Ok(machine) = self.core.machine.lock() {
            if let Some(outcome) = machine.abandon() {
                self.core.dispatch(Effects {
                    cues: Vec::new(),
                    outcome: Some(outcome),
                });
            }
        }
        self.core.log(Level::DEBUG, "engine stopped");
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;
    use tokio::time::sleep;

    use super::*;
    use crate::services::diagnostics::testing::MemoryDiagnostics;
    use crate::services::SessionRecord;
    use crate::state::{IntervalType, TimerState};

    fn config() -> TimerConfig {
        TimerConfig::new(5, 5, 2, false, false, 3).unwrap()
    }

    fn engine_with(
        diagnostics: Arc<MemoryDiagnostics>,
    ) -> (TimerEngine, mpsc::UnboundedReceiver<SessionRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = TimerEngine::spawn(
            EngineOptions::new("test", config())
                .with_recorder(Arc::new(tx))
                .with_diagnostics(diagnostics),
        );
        (engine, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn tick_loop_runs_countdown_into_work() {
        let (engine, _records) = engine_with(Arc::default());
        engine.start(config(), SessionLabel::default()).unwrap();
        assert_eq!(engine.status().state, TimerState::Begin);

        sleep(Duration::from_millis(1_550)).await;
        let status = engine.status();
        assert_eq!(status.state, TimerState::Begin);
        assert_eq!(status.time_remaining_seconds, 1);
        assert_eq!(status.time_remaining_milliseconds, 500);

        sleep(Duration::from_millis(1_600)).await;
        let status = engine.status();
        assert_eq!(status.state, TimerState::Running);
        assert_eq!(status.current_interval, IntervalType::Work);
        assert_eq!(status.time_remaining_seconds, 5);
        assert_eq!(status.time_remaining_milliseconds, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn paused_engine_does_not_advance() {
        let (engine, _records) = engine_with(Arc::default());
        engine.start(config(), SessionLabel::default()).unwrap();
        sleep(Duration::from_millis(4_050)).await;
        assert_eq!(engine.pause().unwrap(), Transition::Applied);
        let frozen = engine.status();

        sleep(Duration::from_secs(30)).await;
        assert_eq!(engine.status(), frozen);

        engine.resume().unwrap();
        sleep(Duration::from_millis(250)).await;
        let resumed = engine.status();
        assert_eq!(resumed.state, TimerState::Running);
        assert_eq!(
            frozen.remaining().as_duration() - resumed.remaining().as_duration(),
            Duration::from_millis(200)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_transitions_warn_without_failing() {
        let diagnostics = Arc::new(MemoryDiagnostics::default());
        let (engine, _records) = engine_with(Arc::clone(&diagnostics));

        assert_eq!(engine.reset().unwrap(), Transition::Ignored);
        assert_eq!(engine.pause().unwrap(), Transition::Ignored);
        engine.start(config(), SessionLabel::default()).unwrap();
        assert_eq!(engine.pause().unwrap(), Transition::Ignored);
        assert_eq!(engine.start(config(), SessionLabel::default()).unwrap(), Transition::Ignored);

        let warnings = diagnostics.warnings();
        assert_eq!(warnings.len(), 4);
        assert_eq!(warnings[0], "reset ignored in state STOPPED");
        assert_eq!(warnings[2], "pause ignored in state BEGIN");
        assert_eq!(engine.status().state, TimerState::Begin);
    }

    #[tokio::test(start_paused = true)]
    async fn full_session_records_completion() {
        let (engine, mut records) = engine_with(Arc::default());
        let label = SessionLabel {
            preset_id: Some("p-7".to_string()),
            preset_name: Some("Sprints".to_string()),
            exercise_name: None,
        };
        engine.start(config(), label).unwrap();

        sleep(Duration::from_secs(30)).await;
        assert_eq!(engine.status().state, TimerState::Finished);

        let record = records.recv().await.expect("session record");
        assert!(record.completed);
        assert_eq!(record.rounds_completed, 2);
        assert_eq!(record.total_work_seconds, 10);
        assert_eq!(record.preset_name.as_deref(), Some("Sprints"));
        assert!(records.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_mid_session_records_abandonment() {
        let (engine, mut records) = engine_with(Arc::default());
        engine.start(config(), SessionLabel::default()).unwrap();
        sleep(Duration::from_secs(5)).await;
        drop(engine);

        let record = records.recv().await.expect("abandoned record");
        assert!(!record.completed);
        assert!(records.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn cues_follow_transitions() {
        let (engine, _records) = engine_with(Arc::default());
        let mut cues = engine.subscribe_cues();
        engine.start(config(), SessionLabel::default()).unwrap();
        sleep(Duration::from_millis(3_150)).await;

        let mut received = Vec::new();
        while let Ok(cue) = cues.try_recv() {
            received.push(cue);
        }
        assert_eq!(
            received,
            vec![
                TimerCue::CountdownTick { seconds_left: 3 },
                TimerCue::CountdownTick { seconds_left: 2 },
                TimerCue::CountdownTick { seconds_left: 1 },
                TimerCue::WorkStart { round: 1 },
            ]
        );
    }
}
