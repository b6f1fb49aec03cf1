//! Saved workout presets as handed over by the preset store

use serde::{Deserialize, Serialize};

use super::TimerConfig;
use crate::error::ConfigError;

/// A preset with its display metadata. The engine only ever sees the
/// materialized [`TimerConfig`] plus the attribution fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub exercise_name: Option<String>,
    pub work_time_seconds: u32,
    pub rest_time_seconds: u32,
    pub total_rounds: u32,
    #[serde(default)]
    pub is_unlimited: bool,
    #[serde(default)]
    pub no_rest: bool,
}

impl Preset {
    /// Validate the preset against the timer domains.
    ///
    /// Presets carry no countdown of their own; the caller's current
    /// countdown setting is kept.
    pub fn to_config(&self, countdown_duration_seconds: u32) -> Result<TimerConfig, ConfigError> {
        TimerConfig::new(
            self.work_time_seconds,
            self.rest_time_seconds,
            self.total_rounds,
            self.is_unlimited,
            self.no_rest,
            countdown_duration_seconds,
        )
    }
}
