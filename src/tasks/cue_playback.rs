//! Cue playback background task

use tokio::sync::{broadcast, broadcast::error::RecvError};
use tracing::{info, warn};

use crate::{error::AppError, services::TimerCue};

/// Stand-in audio sink: announces each merged cue in the log.
pub async fn cue_playback_task(mut cues: broadcast::Receiver<TimerCue>, enabled: bool) {
    info!("Starting cue playback task (sound {})", if enabled { "on" } else { "off" });

    loop {
        match cues.recv().await {
            Ok(cue) if enabled => info!("Cue: {:?}", cue),
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                let err = AppError::Audio(format!("{skipped} cues dropped"));
                warn!("{} ({:?})", err, err.recovery());
            }
            Err(RecvError::Closed) => break,
        }
    }
}
