//! Engine tick loop background task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::debug;

use crate::engine::EngineCore;

/// Drives one engine while it is in BEGIN or RUNNING.
///
/// Idle and paused engines park on their status channel instead of ticking.
/// Every tick hands the machine the real instant, so late wake-ups are
/// absorbed by the next elapsed measurement rather than accumulating.
pub async fn tick_loop_task(engine: Arc<EngineCore>, period: Duration) {
    debug!("Starting tick loop for {} engine", engine.name());

    let mut status_rx = engine.subscribe();

    loop {
        if status_rx.wait_for(|status| status.state.is_ticking()).await.is_err() {
            break;
        }
        debug!("{} engine ticking every {:?}", engine.name(), period);

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if !engine.tick(Instant::now()) {
                break;
            }
        }

        debug!("{} engine stopped ticking", engine.name());
    }
}
