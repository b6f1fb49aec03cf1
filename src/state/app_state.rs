//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::{
    engine::{SessionLabel, StatusReconciler, Transition},
    error::AppError,
    services::SessionRecord,
    state::TimerConfig,
};

/// Shared state of the timer daemon
pub struct AppState {
    /// Merged view over the fallback engine and the background runner
    pub reconciler: StatusReconciler,
    /// Sessions recorded since startup, oldest first
    pub history: Arc<Mutex<Vec<SessionRecord>>>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl AppState {
    pub fn new(reconciler: StatusReconciler, port: u16, host: String) -> Self {
        Self {
            reconciler,
            history: Arc::new(Mutex::new(Vec::new())),
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
        }
    }

    /// Remember the most recent control action
    fn track_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    pub fn start(&self, config: TimerConfig, label: SessionLabel) -> Result<Transition, AppError> {
        info!("Start requested: {}s work / {}s rest", config.work_time_seconds(), config.rest_time_seconds());
        self.track_action("start");
        self.reconciler.start(config, label)
    }

    pub fn pause(&self) -> Result<Transition, AppError> {
        self.track_action("pause");
        self.reconciler.pause()
    }

    pub fn resume(&self) -> Result<Transition, AppError> {
        self.track_action("resume");
        self.reconciler.resume()
    }

    pub fn reset(&self) -> Result<Transition, AppError> {
        self.track_action("reset");
        self.reconciler.reset()
    }

    pub fn update_config(&self, config: TimerConfig) -> Result<Transition, AppError> {
        self.track_action("update-config");
        self.reconciler.update_config(config)
    }

    pub fn attach_background(&self) {
        self.track_action("background-attach");
        self.reconciler.background().attach();
    }

    pub fn detach_background(&self) {
        self.track_action("background-detach");
        self.reconciler.background().detach();
    }

    /// Append a finished or abandoned session
    pub fn push_history(&self, record: SessionRecord) -> Result<(), AppError> {
        self.history
            .lock()
            .map(|mut history| history.push(record))
            .map_err(|e| AppError::History(format!("Failed to lock history: {}", e)))
    }

    pub fn get_history(&self) -> Result<Vec<SessionRecord>, AppError> {
        self.history
            .lock()
            .map(|history| history.clone())
            .map_err(|e| AppError::History(format!("Failed to lock history: {}", e)))
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
