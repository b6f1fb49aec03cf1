//! State management module
//!
//! Value types describing a timer (config, status snapshot, presets) and the
//! shared application state of the daemon.

pub mod app_state;
pub mod preset;
pub mod timer_config;
pub mod timer_status;

// Re-export main types
pub use app_state::AppState;
pub use preset::Preset;
pub use timer_config::{RawTimerConfig, TimerConfig};
pub use timer_status::{IntervalType, SplitTime, TimerState, TimerStatus};
