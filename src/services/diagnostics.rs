//! Injected logging collaborator
//!
//! Engines never log through a process-wide handle; they receive a
//! [`Diagnostics`] at construction so tests and embedders can observe what
//! the timer reports.

use tracing::Level;

pub trait Diagnostics: Send + Sync {
    fn log(&self, level: Level, category: &str, message: &str);
}

/// Forwards diagnostics to `tracing` with the category as a field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn log(&self, level: Level, category: &str, message: &str) {
        if level == Level::ERROR {
            tracing::error!(category, "{}", message);
        } else if level == Level::WARN {
            tracing::warn!(category, "{}", message);
        } else if level == Level::INFO {
            tracing::info!(category, "{}", message);
        } else if level == Level::DEBUG {
            tracing::debug!(category, "{}", message);
        } else {
            tracing::trace!(category, "{}", message);
        }
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Keeps every entry in memory for assertions.
    #[derive(Debug, Default)]
    pub struct MemoryDiagnostics {
        entries: Mutex<Vec<(Level, String, String)>>,
    }

    impl MemoryDiagnostics {
        pub fn warnings(&self) -> Vec<String> {
            self.entries
                .lock()
                .unwrap()
                .iter()
                .filter(|(level, _, _)| *level == Level::WARN)
                .map(|(_, _, message)| message.clone())
                .collect()
        }
    }

    impl Diagnostics for MemoryDiagnostics {
        fn log(&self, level: Level, category: &str, message: &str) {
            self.entries
                .lock()
                .unwrap()
                .push((level, category.to_string(), message.to_string()));
        }
    }
}
