//! Pure interval state machine
//!
//! `TimerMachine` has no clock and no channels: every operation takes the
//! current instant and returns the side effects it produced. The async
//! engine wraps it with a tick loop and publishes its snapshots.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::services::{SessionRecord, TimerCue};
use crate::state::{IntervalType, SplitTime, TimerConfig, TimerState, TimerStatus};

/// Seconds before a boundary during which countdown cues fire.
const CUE_LEAD_SECONDS: u32 = 3;

/// Result of a control operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Ignored,
}

impl Transition {
    pub fn is_applied(self) -> bool {
        self == Transition::Applied
    }
}

/// Preset attribution carried through a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionLabel {
    pub preset_id: Option<String>,
    pub preset_name: Option<String>,
    pub exercise_name: Option<String>,
}

/// How a session ended, before it is stamped with a wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub label: SessionLabel,
    pub rounds_completed: u32,
    pub total_work_seconds: u64,
    pub completed: bool,
}

impl SessionOutcome {
    pub fn into_record(self, timestamp: DateTime<Utc>) -> SessionRecord {
        SessionRecord {
            preset_id: self.label.preset_id,
            preset_name: self.label.preset_name,
            exercise_name: self.label.exercise_name,
            rounds_completed: self.rounds_completed,
            total_work_seconds: self.total_work_seconds,
            completed: self.completed,
            timestamp,
        }
    }
}

/// Side effects produced by one step of the machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Effects {
    pub cues: Vec<TimerCue>,
    pub outcome: Option<SessionOutcome>,
}

#[derive(Debug, Clone)]
pub struct TimerMachine {
    status: TimerStatus,
    /// Exact remaining time; the status carries its split rendering.
    remaining: Duration,
    /// Instant the last elapsed measurement ended. `None` while not ticking.
    last_tick: Option<Instant>,
    work_elapsed: Duration,
    rounds_completed: u32,
}

impl TimerMachine {
    pub fn new(config: TimerConfig) -> Self {
        Self {
            status: TimerStatus::stopped(config),
            remaining: config.work_duration(),
            last_tick: None,
            work_elapsed: Duration::ZERO,
            rounds_completed: 0,
        }
    }

    pub fn status(&self) -> &TimerStatus {
        &self.status
    }

    pub fn config(&self) -> TimerConfig {
        self.status.config
    }

    pub fn start(
        &mut self,
        config: TimerConfig,
        label: SessionLabel,
        now: Instant,
    ) -> (Transition, Effects) {
        if !self.status.can_start() {
            return (Transition::Ignored, Effects::default());
        }

        self.status = TimerStatus {
            state: TimerState::Begin,
            current_interval: IntervalType::Work,
            current_round: 1,
            preset_id: label.preset_id,
            preset_name: label.preset_name,
            exercise_name: label.exercise_name,
            ..TimerStatus::stopped(config)
        };
        self.remaining = config.countdown_duration();
        self.last_tick = Some(now);
        self.work_elapsed = Duration::ZERO;
        self.rounds_completed = 0;
        self.sync_remaining();

        let effects = Effects {
            cues: vec![TimerCue::CountdownTick {
                seconds_left: config.countdown_duration_seconds(),
            }],
            outcome: None,
        };
        (Transition::Applied, effects)
    }

    /// Freezes remaining time at `now`. Time since the last tick is counted
    /// against the current interval; a boundary reached that way is crossed
    /// on the first tick after resuming.
    pub fn pause(&mut self, now: Instant) -> (Transition, Effects) {
        if !self.status.can_pause() {
            return (Transition::Ignored, Effects::default());
        }
        let mut effects = Effects::default();
        if let Some(last_tick) = self.last_tick {
            self.consume(now.saturating_duration_since(last_tick), &mut effects);
            self.sync_remaining();
        }
        self.status.state = TimerState::Paused;
        self.last_tick = None;
        (Transition::Applied, effects)
    }

    pub fn resume(&mut self, now: Instant) -> (Transition, Effects) {
        if !self.status.can_resume() {
            return (Transition::Ignored, Effects::default());
        }
        self.status.state = TimerState::Running;
        self.last_tick = Some(now);
        (Transition::Applied, Effects::default())
    }

    pub fn reset(&mut self) -> (Transition, Effects) {
        if !self.status.can_reset() {
            return (Transition::Ignored, Effects::default());
        }
        let outcome = self
            .status
            .state
            .is_in_session()
            .then(|| self.outcome(false));

        let config = self.status.config;
        *self = Self::new(config);
        (Transition::Applied, Effects { cues: Vec::new(), outcome })
    }

    /// Swap the config. An idle timer previews the new work time; a running
    /// session keeps its current remaining time and picks the new values up
    /// at its next boundary.
    pub fn update_config(&mut self, config: TimerConfig) -> (Transition, Effects) {
        self.status.config = config;
        if self.status.state == TimerState::Stopped {
            *self = Self::new(config);
        }
        (Transition::Applied, Effects::default())
    }

    /// Outcome for a session that is torn down without a reset.
    pub fn abandon(&self) -> Option<SessionOutcome> {
        self.status
            .state
            .is_in_session()
            .then(|| self.outcome(false))
    }

    /// Advance by the time measured since the previous tick.
    ///
    /// The countdown holds its `00:00.0` frame for one tick, so work starts
    /// at its full length. Running intervals cross their boundary in the tick
    /// that reaches zero and the excess is carried into the next interval.
    pub fn tick(&mut self, now: Instant) -> Effects {
        let mut effects = Effects::default();
        let Some(last_tick) = self.last_tick else {
            return effects;
        };
        if !self.status.state.is_ticking() {
            return effects;
        }

        let mut elapsed = now.saturating_duration_since(last_tick);
        self.last_tick = Some(now);

        if self.status.state == TimerState::Begin && self.remaining.is_zero() {
            self.cross_boundary(&mut effects);
        } else {
            loop {
                elapsed = self.consume(elapsed, &mut effects);
                if self.status.state != TimerState::Running || !self.remaining.is_zero() {
                    break;
                }
                self.cross_boundary(&mut effects);
                if elapsed.is_zero() || self.status.state == TimerState::Finished {
                    break;
                }
            }
        }

        self.sync_remaining();
        effects
    }

    /// Take up to `elapsed` off the current interval and return the rest.
    fn consume(&mut self, elapsed: Duration, effects: &mut Effects) -> Duration {
        let before = SplitTime::from_duration(self.remaining).ceil_seconds();
        let step = elapsed.min(self.remaining);
        if self.status.state == TimerState::Running && self.status.is_work_interval() {
            self.work_elapsed += step;
        }
        self.remaining -= step;

        let after = SplitTime::from_duration(self.remaining).ceil_seconds();
        let in_lead = self.status.state == TimerState::Begin || after <= CUE_LEAD_SECONDS;
        if after < before && after > 0 && in_lead {
            effects.cues.push(TimerCue::CountdownTick { seconds_left: after });
        }
        elapsed - step
    }

    fn cross_boundary(&mut self, effects: &mut Effects) {
        let config = self.status.config;
        let round = self.status.current_round;

        match (self.status.state, self.status.current_interval) {
            (TimerState::Begin, _) => {
                self.enter(TimerState::Running, IntervalType::Work, round, config.work_duration());
                effects.cues.push(TimerCue::WorkStart { round });
            }
            (TimerState::Running, IntervalType::Work) => {
                self.rounds_completed += 1;
                if config.is_final_round(round) {
                    self.finish(effects);
                } else if config.no_rest() {
                    self.enter(TimerState::Running, IntervalType::Work, round + 1, config.work_duration());
                    effects.cues.push(TimerCue::WorkStart { round: round + 1 });
                } else {
                    self.enter(TimerState::Running, IntervalType::Rest, round, config.rest_duration());
                    effects.cues.push(TimerCue::RestStart { round });
                }
            }
            (TimerState::Running, IntervalType::Rest) => {
                if config.is_final_round(round) {
                    self.finish(effects);
                } else {
                    self.enter(TimerState::Running, IntervalType::Work, round + 1, config.work_duration());
                    effects.cues.push(TimerCue::WorkStart { round: round + 1 });
                }
            }
            _ => {}
        }
    }

    fn enter(&mut self, state: TimerState, interval: IntervalType, round: u32, duration: Duration) {
        self.status.state = state;
        self.status.current_interval = interval;
        self.status.current_round = round;
        self.remaining = duration;
    }

    fn finish(&mut self, effects: &mut Effects) {
        self.status.state = TimerState::Finished;
        self.remaining = Duration::ZERO;
        self.last_tick = None;
        effects.cues.push(TimerCue::Finished);
        effects.outcome = Some(self.outcome(true));
    }

    fn outcome(&self, completed: bool) -> SessionOutcome {
        SessionOutcome {
            label: SessionLabel {
                preset_id: self.status.preset_id.clone(),
                preset_name: self.status.preset_name.clone(),
                exercise_name: self.status.exercise_name.clone(),
            },
            rounds_completed: self.rounds_completed,
            total_work_seconds: (self.work_elapsed.as_millis() as u64 + 500) / 1000,
            completed,
        }
    }

    fn sync_remaining(&mut self) {
        let split = SplitTime::from_duration(self.remaining);
        self.status.time_remaining_seconds = split.seconds;
        self.status.time_remaining_milliseconds = split.millis;
    }
}
