//! Status and cue merging background tasks

use std::sync::Arc;
use tokio::sync::{broadcast, broadcast::error::RecvError, watch};
use tracing::{debug, Level};

use crate::{
    engine::{select_status, StatusSource},
    error::AppError,
    services::{Diagnostics, TimerCue},
    state::TimerStatus,
};

/// Mirror whichever source is selected into the merged status channel.
///
/// Snapshots are forwarded as they arrive; only the selection is debounced.
pub async fn status_merge_task(
    mut background_rx: watch::Receiver<TimerStatus>,
    mut fallback_rx: watch::Receiver<TimerStatus>,
    mut selected_rx: watch::Receiver<StatusSource>,
    merged_tx: watch::Sender<TimerStatus>,
) {
    debug!("Starting status merge task");

    loop {
        let source = *selected_rx.borrow_and_update();
        let merged = select_status(
            source,
            &background_rx.borrow_and_update(),
            &fallback_rx.borrow_and_update(),
        )
        .clone();
        merged_tx.send_if_modified(|current| {
            if *current == merged {
                false
            } else {
                *current = merged;
                true
            }
        });

        let closed = tokio::select! {
            changed = selected_rx.changed() => changed.is_err(),
            changed = background_rx.changed(), if source == StatusSource::Background => changed.is_err(),
            changed = fallback_rx.changed(), if source == StatusSource::Fallback => changed.is_err(),
        };
        if closed {
            break;
        }
    }
}

/// Forward cues from the selected source only, so a mirrored session never
/// plays its sounds twice.
pub async fn cue_merge_task(
    mut background_cues: broadcast::Receiver<TimerCue>,
    mut fallback_cues: broadcast::Receiver<TimerCue>,
    selected_rx: watch::Receiver<StatusSource>,
    merged_tx: broadcast::Sender<TimerCue>,
    diagnostics: Arc<dyn Diagnostics>,
) {
    debug!("Starting cue merge task");

    loop {
        let (source, received) = tokio::select! {
            cue = background_cues.recv() => (StatusSource::Background, cue),
            cue = fallback_cues.recv() => (StatusSource::Fallback, cue),
        };

        match received {
            Ok(cue) => {
                if *selected_rx.borrow() == source {
                    let _ = merged_tx.send(cue);
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                let err = AppError::Audio(format!("{skipped} cues skipped from {source:?}"));
                diagnostics.log(Level::WARN, "cues", &err.to_string());
            }
            Err(RecvError::Closed) => break,
        }
    }
}
