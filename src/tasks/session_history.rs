//! Session history background task

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};

use crate::{services::SessionRecord, state::AppState};

/// Drain session records into the in-memory history.
///
/// Runs until every recorder handle is gone or `shutdown` fires. On shutdown
/// the channel is closed and records already sent are still stored.
pub async fn session_history_task(
    state: Arc<AppState>,
    mut records: mpsc::UnboundedReceiver<SessionRecord>,
    mut shutdown: oneshot::Receiver<()>,
) {
    info!("Starting session history task");

    loop {
        tokio::select! {
            record = records.recv() => match record {
                Some(record) => store(&state, record),
                None => break,
            },
            _ = &mut shutdown => {
                records.close();
                while let Some(record) = records.recv().await {
                    store(&state, record);
                }
                break;
            }
        }
    }

    info!("Session history task finished");
}

fn store(state: &AppState, record: SessionRecord) {
    info!(
        "Session {}: {} rounds, {}s of work",
        if record.completed { "completed" } else { "abandoned" },
        record.rounds_completed,
        record.total_work_seconds
    );
    if let Err(e) = state.push_history(record) {
        error!("Failed to store session record: {} ({:?})", e, e.recovery());
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::engine::{ReconcilerSettings, RunnerContext, StatusReconciler};
    use crate::services::NoopRecorder;
    use crate::state::TimerConfig;

    fn record(completed: bool) -> SessionRecord {
        SessionRecord {
            preset_id: None,
            preset_name: None,
            exercise_name: None,
            rounds_completed: 1,
            total_work_seconds: 5,
            completed,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_drains_buffered_records() {
        let mut settings = ReconcilerSettings::new(TimerConfig::default(), Arc::new(NoopRecorder));
        settings.runner_context = RunnerContext::Current;
        let reconciler = StatusReconciler::spawn(settings).unwrap();
        let state = Arc::new(AppState::new(reconciler, 0, "127.0.0.1".to_string()));

        let (tx, rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = oneshot::channel();
        tx.send(record(true)).unwrap();
        tx.send(record(false)).unwrap();
        stop_tx.send(()).unwrap();

        session_history_task(Arc::clone(&state), rx, stop_rx).await;

        let history = state.get_history().unwrap();
        assert_eq!(history.len(), 2);
        assert!(!history[1].completed);
        assert!(tx.send(record(true)).is_err());
    }
}
