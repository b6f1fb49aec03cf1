//! Utility functions module
//!
//! Process-level helpers for the daemon binary.

pub mod signals;

// Re-export main functions
pub use signals::shutdown_signal;
