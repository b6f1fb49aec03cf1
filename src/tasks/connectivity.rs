//! Connectivity debounce background task

use std::time::Duration;
use tokio::{sync::watch, time::sleep};
use tracing::debug;

use crate::engine::StatusSource;

/// Publish the selected status source once background reachability has held
/// still for `window`. Flips shorter than the window never reach observers.
pub async fn connectivity_debounce_task(
    mut reachable_rx: watch::Receiver<bool>,
    selected_tx: watch::Sender<StatusSource>,
    window: Duration,
) {
    debug!("Starting connectivity debounce task ({:?} window)", window);

    loop {
        if reachable_rx.changed().await.is_err() {
            break;
        }

        // Restart the window on every flip until the signal settles.
        loop {
            tokio::select! {
                changed = reachable_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                _ = sleep(window) => break,
            }
        }

        let reachable = *reachable_rx.borrow_and_update();
        let source = StatusSource::from_reachable(reachable);
        let switched = selected_tx.send_if_modified(|current| {
            let switched = *current != source;
            *current = source;
            switched
        });
        if switched {
            debug!("Status source switched to {:?}", source);
        }
    }
}
