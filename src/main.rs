//! Interval Timer - interval workout timer daemon
//!
//! This is the main entry point for the interval-timer application.

use std::sync::Arc;
use anyhow::Context;
use tokio::{net::TcpListener, sync::{mpsc, oneshot}};
use tracing::info;

use interval_timer::{
    api::create_router,
    config::Config,
    engine::{ReconcilerSettings, RunnerContext, StatusReconciler},
    services::SessionRecord,
    state::AppState,
    tasks::{cue_playback_task, session_history_task},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("interval_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting interval-timer v{}", env!("CARGO_PKG_VERSION"));

    let timer_config = config.timer_config().context("Invalid default workout")?;
    info!(
        "Default workout: {}s work, {}s rest, {} rounds{}{}",
        timer_config.work_time_seconds(),
        timer_config.rest_time_seconds(),
        timer_config.total_rounds(),
        if timer_config.is_unlimited() { " (unlimited)" } else { "" },
        if timer_config.no_rest() { " (no rest)" } else { "" },
    );

    // Session records flow from the engines into the history task
    let (record_tx, record_rx) = mpsc::unbounded_channel::<SessionRecord>();

    let mut settings = ReconcilerSettings::new(timer_config, Arc::new(record_tx));
    settings.tick_interval = config.tick_interval();
    settings.debounce_window = config.debounce_window();
    settings.runner_context = RunnerContext::Dedicated;
    let reconciler = StatusReconciler::spawn(settings).context("Failed to start timer engines")?;

    // The foreground is bound to the runner for as long as the server runs
    reconciler.background().attach();
    let cues = reconciler.subscribe_cues();

    let state = Arc::new(AppState::new(reconciler, config.port, config.host.clone()));

    let (history_stop_tx, history_stop_rx) = oneshot::channel();
    let history_task = tokio::spawn(session_history_task(
        Arc::clone(&state),
        record_rx,
        history_stop_rx,
    ));
    tokio::spawn(cue_playback_task(cues, !config.mute));

    let app = create_router(Arc::clone(&state));

    let addr = config.address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /start              - Start a session (optional config/preset body)");
    info!("  POST /pause              - Pause the running interval");
    info!("  POST /resume             - Resume a paused interval");
    info!("  POST /reset              - Stop and reset the session");
    info!("  PUT  /config             - Replace the timer configuration");
    info!("  GET  /status             - Merged timer status");
    info!("  GET  /history            - Recorded sessions");
    info!("  POST /background/attach  - Bind to the background runner");
    info!("  POST /background/detach  - Unbind from the background runner");
    info!("  GET  /health             - Health check");

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    // A session still in progress is recorded as abandoned before exit.
    // Its record is already queued when reset returns, so draining the
    // history channel picks it up.
    if state.reconciler.status().state.is_in_session() {
        if let Err(e) = state.reset() {
            tracing::error!("Failed to stop session on shutdown: {}", e);
        }
    }
    let _ = history_stop_tx.send(());
    if let Err(e) = history_task.await {
        tracing::error!("Session history task failed: {}", e);
    }
    match state.get_history() {
        Ok(history) => info!("{} sessions recorded this run", history.len()),
        Err(e) => tracing::error!("{}", e),
    }

    info!("Server shutdown complete");
    Ok(())
}
