//! Session recording collaborator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

/// One finished or abandoned workout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub preset_id: Option<String>,
    pub preset_name: Option<String>,
    pub exercise_name: Option<String>,
    pub rounds_completed: u32,
    pub total_work_seconds: u64,
    pub completed: bool,
    pub timestamp: DateTime<Utc>,
}

/// Receives exactly one record per session end. Implementations must not
/// block; the timer never retries a record.
pub trait SessionRecorder: Send + Sync {
    fn record(&self, record: SessionRecord);
}

impl SessionRecorder for mpsc::UnboundedSender<SessionRecord> {
    fn record(&self, record: SessionRecord) {
        if let Err(e) = self.send(record) {
            warn!("Session recorder closed, dropping record: {:?}", e.0);
        }
    }
}

/// Discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRecorder;

impl SessionRecorder for NoopRecorder {
    fn record(&self, _record: SessionRecord) {}
}
