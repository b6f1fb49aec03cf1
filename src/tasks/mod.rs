//! Background tasks module
//!
//! Long-running tokio tasks: engine tick loops, reconciler plumbing and the
//! consumers of session records and cues.

pub mod connectivity;
pub mod cue_playback;
pub mod session_history;
pub mod status_merge;
pub mod tick_loop;

// Re-export main functions
pub use connectivity::connectivity_debounce_task;
pub use cue_playback::cue_playback_task;
pub use session_history::session_history_task;
pub use status_merge::{cue_merge_task, status_merge_task};
pub use tick_loop::tick_loop_task;
