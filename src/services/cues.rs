//! Audio cue events

use serde::{Deserialize, Serialize};

/// Discrete cue emitted on interval transitions. Playback is someone
/// else's job; the timer never waits for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cue", rename_all = "kebab-case")]
pub enum TimerCue {
    WorkStart { round: u32 },
    RestStart { round: u32 },
    CountdownTick { seconds_left: u32 },
    Finished,
}

/// Capacity of each engine's cue channel.
pub const CUE_CHANNEL_CAPACITY: usize = 64;
