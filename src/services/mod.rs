//! External collaborator module
//!
//! The timer talks to the outside world through these seams: diagnostics,
//! session recording and audio cues.

pub mod cues;
pub mod diagnostics;
pub mod recorder;

// Re-export main types
pub use cues::{TimerCue, CUE_CHANNEL_CAPACITY};
pub use diagnostics::{Diagnostics, TracingDiagnostics};
pub use recorder::{NoopRecorder, SessionRecord, SessionRecorder};
