//! Timer status snapshot and its derived display state

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::TimerConfig;

/// How close to a boundary the next-interval preview starts showing.
pub const PREVIEW_WINDOW: Duration = Duration::from_secs(5);

/// Lifecycle state of a workout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimerState {
    Stopped,
    Begin,
    Running,
    Paused,
    Finished,
}

impl TimerState {
    /// States in which the tick loop advances remaining time.
    pub fn is_ticking(self) -> bool {
        matches!(self, TimerState::Begin | TimerState::Running)
    }

    /// States belonging to a session that has started and not yet ended.
    pub fn is_in_session(self) -> bool {
        matches!(
            self,
            TimerState::Begin | TimerState::Running | TimerState::Paused
        )
    }
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimerState::Stopped => "STOPPED",
            TimerState::Begin => "BEGIN",
            TimerState::Running => "RUNNING",
            TimerState::Paused => "PAUSED",
            TimerState::Finished => "FINISHED",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntervalType {
    Work,
    Rest,
}

impl fmt::Display for IntervalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntervalType::Work => f.write_str("Work"),
            IntervalType::Rest => f.write_str("Rest"),
        }
    }
}

/// Remaining time split into whole seconds and a millisecond part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct SplitTime {
    pub seconds: u32,
    /// Always in `0..1000`.
    pub millis: u32,
}

impl SplitTime {
    pub fn from_duration(duration: Duration) -> Self {
        Self {
            seconds: u32::try_from(duration.as_secs()).unwrap_or(u32::MAX),
            millis: duration.subsec_millis(),
        }
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_secs(self.seconds.into()) + Duration::from_millis(self.millis.into())
    }

    /// Seconds rounded up, as shown on a countdown.
    pub fn ceil_seconds(self) -> u32 {
        self.seconds + u32::from(self.millis > 0)
    }
}

impl fmt::Display for SplitTime {
    /// `MM:SS.t`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}.{}",
            self.seconds / 60,
            self.seconds % 60,
            self.millis / 100
        )
    }
}

/// Immutable snapshot of a timer at one instant.
///
/// A new snapshot is produced for every tick and operation; nothing mutates
/// one after it has been published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerStatus {
    pub state: TimerState,
    pub current_interval: IntervalType,
    pub time_remaining_seconds: u32,
    pub time_remaining_milliseconds: u32,
    pub current_round: u32,
    pub config: TimerConfig,
    pub preset_id: Option<String>,
    pub preset_name: Option<String>,
    pub exercise_name: Option<String>,
}

impl TimerStatus {
    /// Idle status previewing the work duration of `config`.
    pub fn stopped(config: TimerConfig) -> Self {
        Self {
            state: TimerState::Stopped,
            current_interval: IntervalType::Work,
            time_remaining_seconds: config.work_time_seconds(),
            time_remaining_milliseconds: 0,
            current_round: 1,
            config,
            preset_id: None,
            preset_name: None,
            exercise_name: None,
        }
    }

    pub fn remaining(&self) -> SplitTime {
        SplitTime {
            seconds: self.time_remaining_seconds,
            millis: self.time_remaining_milliseconds,
        }
    }

    pub fn can_start(&self) -> bool {
        matches!(self.state, TimerState::Stopped | TimerState::Finished)
    }

    pub fn can_pause(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn can_resume(&self) -> bool {
        self.state == TimerState::Paused
    }

    pub fn can_reset(&self) -> bool {
        self.state != TimerState::Stopped
    }

    pub fn is_work_interval(&self) -> bool {
        self.current_interval == IntervalType::Work
    }

    pub fn formatted_time(&self) -> String {
        self.remaining().to_string()
    }

    pub fn round_text(&self) -> String {
        if self.config.is_unlimited() {
            format!("Round {}", self.current_round)
        } else {
            format!("Round {} of {}", self.current_round, self.config.total_rounds())
        }
    }

    pub fn countdown_text(&self) -> Option<String> {
        (self.state == TimerState::Begin)
            .then(|| format!("Start in {}", self.remaining().ceil_seconds()))
    }

    /// Describes the upcoming interval once the current one is about to end.
    pub fn next_interval_preview(&self) -> Option<String> {
        if !matches!(self.state, TimerState::Running | TimerState::Paused) {
            return None;
        }
        if self.remaining().as_duration() > PREVIEW_WINDOW {
            return None;
        }

        let config = &self.config;
        let preview = match self.current_interval {
            IntervalType::Work if config.is_final_round(self.current_round) => {
                "Next: Finish".to_string()
            }
            IntervalType::Work if config.no_rest() => {
                format!("Next: Work, round {}", self.current_round + 1)
            }
            IntervalType::Work => format!("Next: Rest {}s", config.rest_time_seconds()),
            IntervalType::Rest => format!(
                "Next: Work {}s, round {}",
                config.work_time_seconds(),
                self.current_round + 1
            ),
        };
        Some(preview)
    }
}

impl Default for TimerStatus {
    fn default() -> Self {
        Self::stopped(TimerConfig::default())
    }
}
