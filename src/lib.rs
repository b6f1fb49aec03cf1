//! Interval Timer - work/rest interval engine with background reconciliation
//!
//! This library provides the interval state machine, an async engine that
//! ticks it, a background runner hosting a second engine, and a reconciler
//! that merges both into one status stream. A small HTTP server exposes the
//! reconciled timer.

pub mod config;
pub mod error;
pub mod state;
pub mod engine;
pub mod api;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ConfigError, ErrorKind, RecoveryAction};
pub use engine::{StatusReconciler, TimerEngine, Transition};
pub use state::{AppState, TimerConfig, TimerStatus};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
