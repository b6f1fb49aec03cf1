//! Validated workout configuration

use std::ops::RangeInclusive;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const WORK_TIME_RANGE: RangeInclusive<u32> = 5..=900;
pub const REST_TIME_RANGE: RangeInclusive<u32> = 5..=300;
pub const ROUNDS_RANGE: RangeInclusive<u32> = 1..=99;
pub const COUNTDOWN_RANGE: RangeInclusive<u32> = 3..=10;

/// Immutable interval configuration.
///
/// Fields are private so a `TimerConfig` can only exist after validation;
/// changing a setting means building a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimerConfig")]
pub struct TimerConfig {
    work_time_seconds: u32,
    rest_time_seconds: u32,
    total_rounds: u32,
    is_unlimited: bool,
    no_rest: bool,
    countdown_duration_seconds: u32,
}

/// Unvalidated wire shape of [`TimerConfig`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawTimerConfig {
    pub work_time_seconds: u32,
    pub rest_time_seconds: u32,
    pub total_rounds: u32,
    #[serde(default)]
    pub is_unlimited: bool,
    #[serde(default)]
    pub no_rest: bool,
    #[serde(default = "default_countdown")]
    pub countdown_duration_seconds: u32,
}

fn default_countdown() -> u32 {
    TimerConfig::DEFAULT.countdown_duration_seconds
}

fn check(field: &'static str, value: u32, range: RangeInclusive<u32>) -> Result<u32, ConfigError> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError {
            field,
            min: *range.start(),
            max: *range.end(),
            value,
        })
    }
}

impl TimerConfig {
    pub const DEFAULT: TimerConfig = TimerConfig {
        work_time_seconds: 45,
        rest_time_seconds: 15,
        total_rounds: 8,
        is_unlimited: false,
        no_rest: false,
        countdown_duration_seconds: 5,
    };

    /// Build a config, rejecting the first field found outside its domain.
    ///
    /// `total_rounds` is checked even when `is_unlimited` is set so a stored
    /// config stays valid if the flag is later cleared.
    pub fn new(
        work_time_seconds: u32,
        rest_time_seconds: u32,
        total_rounds: u32,
        is_unlimited: bool,
        no_rest: bool,
        countdown_duration_seconds: u32,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            work_time_seconds: check("work_time_seconds", work_time_seconds, WORK_TIME_RANGE)?,
            rest_time_seconds: check("rest_time_seconds", rest_time_seconds, REST_TIME_RANGE)?,
            total_rounds: check("total_rounds", total_rounds, ROUNDS_RANGE)?,
            is_unlimited,
            no_rest,
            countdown_duration_seconds: check(
                "countdown_duration_seconds",
                countdown_duration_seconds,
                COUNTDOWN_RANGE,
            )?,
        })
    }

    pub fn work_time_seconds(&self) -> u32 {
        self.work_time_seconds
    }

    pub fn rest_time_seconds(&self) -> u32 {
        self.rest_time_seconds
    }

    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    pub fn is_unlimited(&self) -> bool {
        self.is_unlimited
    }

    pub fn no_rest(&self) -> bool {
        self.no_rest
    }

    pub fn countdown_duration_seconds(&self) -> u32 {
        self.countdown_duration_seconds
    }

    pub fn work_duration(&self) -> Duration {
        Duration::from_secs(self.work_time_seconds.into())
    }

    pub fn rest_duration(&self) -> Duration {
        Duration::from_secs(self.rest_time_seconds.into())
    }

    pub fn countdown_duration(&self) -> Duration {
        Duration::from_secs(self.countdown_duration_seconds.into())
    }

    /// Whether `round` is the last one of a bounded session.
    pub fn is_final_round(&self, round: u32) -> bool {
        !self.is_unlimited && round >= self.total_rounds
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<RawTimerConfig> for TimerConfig {
    type Error = ConfigError;

    fn try_from(raw: RawTimerConfig) -> Result<Self, Self::Error> {
        TimerConfig::new(
            raw.work_time_seconds,
            raw.rest_time_seconds,
            raw.total_rounds,
            raw.is_unlimited,
            raw.no_rest,
            raw.countdown_duration_seconds,
        )
    }
}
