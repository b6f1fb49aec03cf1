//! Timer engine module
//!
//! The pure state machine, the async engine that ticks it, the background
//! runner hosting a second engine, and the reconciler merging the two.

pub mod background;
pub mod machine;
pub mod reconciler;
pub mod timer_engine;

// Re-export main types
pub use background::{BackgroundRunner, RunnerContext};
pub use machine::{Effects, SessionLabel, SessionOutcome, TimerMachine, Transition};
pub use reconciler::{
    select_status, ReconcilerSettings, StatusReconciler, StatusSource, DEFAULT_DEBOUNCE_WINDOW,
};
pub use timer_engine::{EngineCore, EngineOptions, TimerEngine, DEFAULT_TICK_INTERVAL};
