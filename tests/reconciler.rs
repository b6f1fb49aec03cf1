use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;

use interval_timer::engine::{
    ReconcilerSettings, RunnerContext, SessionLabel, StatusReconciler, StatusSource,
};
use interval_timer::services::{NoopRecorder, SessionRecord, SessionRecorder, TimerCue};
use interval_timer::state::{TimerConfig, TimerState, TimerStatus};

fn short_config() -> TimerConfig {
    TimerConfig::new(5, 5, 1, false, false, 3).unwrap()
}

fn reconciler_with(recorder: Arc<dyn SessionRecorder>) -> StatusReconciler {
    let mut settings = ReconcilerSettings::new(TimerConfig::default(), recorder);
    settings.runner_context = RunnerContext::Current;
    StatusReconciler::spawn(settings).unwrap()
}

/// Collect every snapshot the merged stream publishes.
fn collect_merged(reconciler: &StatusReconciler) -> Arc<Mutex<Vec<TimerStatus>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut rx = reconciler.subscribe();
    let sink = Arc::clone(&seen);
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let status = rx.borrow_and_update().clone();
            sink.lock().unwrap().push(status);
        }
    });
    seen
}

async fn attach_and_settle(reconciler: &StatusReconciler) {
    reconciler.background().attach();
    sleep(Duration::from_millis(400)).await;
    assert_eq!(reconciler.source(), StatusSource::Background);
}

#[tokio::test(start_paused = true)]
async fn short_flicker_never_switches_source() {
    let reconciler = reconciler_with(Arc::new(NoopRecorder));
    reconciler
        .start(TimerConfig::default(), SessionLabel::default())
        .unwrap();
    let seen = collect_merged(&reconciler);

    sleep(Duration::from_millis(50)).await;
    reconciler.background().attach();
    sleep(Duration::from_millis(100)).await;
    reconciler.background().detach();
    sleep(Duration::from_secs(1)).await;

    assert_eq!(reconciler.source(), StatusSource::Fallback);
    let seen = seen.lock().unwrap();
    assert!(!seen.is_empty());
    // The idle background engine must never leak into the merged stream.
    assert!(seen.iter().all(|status| status.state != TimerState::Stopped));
}

#[tokio::test(start_paused = true)]
async fn sustained_attach_switches_after_window() {
    let reconciler = reconciler_with(Arc::new(NoopRecorder));
    reconciler.background().attach();

    sleep(Duration::from_millis(200)).await;
    assert_eq!(reconciler.source(), StatusSource::Fallback);

    sleep(Duration::from_millis(200)).await;
    assert_eq!(reconciler.source(), StatusSource::Background);
}

#[tokio::test(start_paused = true)]
async fn start_is_mirrored_and_pause_is_not() {
    let reconciler = reconciler_with(Arc::new(NoopRecorder));
    attach_and_settle(&reconciler).await;

    reconciler
        .start(short_config(), SessionLabel::default())
        .unwrap();
    assert_eq!(reconciler.background().status().state, TimerState::Begin);
    assert_eq!(reconciler.fallback().status().state, TimerState::Begin);

    sleep(Duration::from_millis(4_000)).await;
    assert!(reconciler.pause().unwrap().is_applied());
    sleep(Duration::from_millis(200)).await;

    assert_eq!(reconciler.background().status().state, TimerState::Paused);
    assert_eq!(reconciler.fallback().status().state, TimerState::Running);
    assert_eq!(reconciler.status().state, TimerState::Paused);
}

#[tokio::test(start_paused = true)]
async fn detach_mid_session_follows_fallback() {
    let reconciler = reconciler_with(Arc::new(NoopRecorder));
    attach_and_settle(&reconciler).await;
    reconciler
        .start(TimerConfig::default(), SessionLabel::default())
        .unwrap();
    sleep(Duration::from_secs(10)).await;

    reconciler.background().detach();
    // Control goes to the fallback right away, the merged view follows later.
    assert!(reconciler.pause().unwrap().is_applied());
    assert_eq!(reconciler.source(), StatusSource::Background);
    assert_eq!(reconciler.status().state, TimerState::Running);

    sleep(Duration::from_millis(400)).await;
    assert_eq!(reconciler.source(), StatusSource::Fallback);
    let status = reconciler.status();
    assert_eq!(status.state, TimerState::Paused);
    assert_eq!(status.current_round, 1);
}

#[tokio::test(start_paused = true)]
async fn mirrored_session_records_once() {
    let (tx, mut records) = mpsc::unbounded_channel::<SessionRecord>();
    let reconciler = reconciler_with(Arc::new(tx));
    attach_and_settle(&reconciler).await;

    let label = SessionLabel {
        exercise_name: Some("Burpees".to_string()),
        ..SessionLabel::default()
    };
    reconciler.start(short_config(), label).unwrap();
    sleep(Duration::from_secs(20)).await;

    assert_eq!(reconciler.status().state, TimerState::Finished);
    assert_eq!(reconciler.fallback().status().state, TimerState::Finished);

    let record = records.recv().await.expect("session record");
    assert!(record.completed);
    assert_eq!(record.rounds_completed, 1);
    assert_eq!(record.exercise_name.as_deref(), Some("Burpees"));
    assert!(records.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn mirrored_session_cues_play_once() {
    let reconciler = reconciler_with(Arc::new(NoopRecorder));
    attach_and_settle(&reconciler).await;
    let mut cues = reconciler.subscribe_cues();

    reconciler
        .start(short_config(), SessionLabel::default())
        .unwrap();
    sleep(Duration::from_millis(3_150)).await;

    let mut received = Vec::new();
    while let Ok(cue) = cues.try_recv() {
        received.push(cue);
    }
    assert_eq!(
        received,
        vec![
            TimerCue::CountdownTick { seconds_left: 3 },
            TimerCue::CountdownTick { seconds_left: 2 },
            TimerCue::CountdownTick { seconds_left: 1 },
            TimerCue::WorkStart { round: 1 },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn reset_while_attached_stops_both_engines() {
    let reconciler = reconciler_with(Arc::new(NoopRecorder));
    attach_and_settle(&reconciler).await;
    reconciler
        .start(short_config(), SessionLabel::default())
        .unwrap();
    sleep(Duration::from_secs(2)).await;

    assert!(reconciler.reset().unwrap().is_applied());
    sleep(Duration::from_millis(100)).await;
    assert_eq!(reconciler.background().status().state, TimerState::Stopped);
    assert_eq!(reconciler.fallback().status().state, TimerState::Stopped);
    assert_eq!(reconciler.status().state, TimerState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn reset_right_after_detach_records_once() {
    let (tx, mut records) = mpsc::unbounded_channel::<SessionRecord>();
    let reconciler = reconciler_with(Arc::new(tx));
    attach_and_settle(&reconciler).await;
    reconciler
        .start(TimerConfig::default(), SessionLabel::default())
        .unwrap();
    sleep(Duration::from_secs(10)).await;

    reconciler.background().detach();
    assert!(reconciler.reset().unwrap().is_applied());
    assert_eq!(reconciler.fallback().status().state, TimerState::Stopped);

    // The unreachable background session runs on to its end unrecorded.
    sleep(Duration::from_secs(600)).await;
    assert_eq!(reconciler.background().status().state, TimerState::Finished);

    let record = records.recv().await.expect("abandoned record");
    assert!(!record.completed);
    assert!(records.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn session_finishing_after_detach_records_once() {
    let (tx, mut records) = mpsc::unbounded_channel::<SessionRecord>();
    let reconciler = reconciler_with(Arc::new(tx));
    attach_and_settle(&reconciler).await;
    reconciler
        .start(short_config(), SessionLabel::default())
        .unwrap();
    sleep(Duration::from_secs(2)).await;

    reconciler.background().detach();
    sleep(Duration::from_secs(20)).await;
    assert_eq!(reconciler.status().state, TimerState::Finished);

    let record = records.recv().await.expect("session record");
    assert!(record.completed);
    assert!(records.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn control_result_is_visible_immediately() {
    let reconciler = reconciler_with(Arc::new(NoopRecorder));
    assert!(reconciler
        .start(short_config(), SessionLabel::default())
        .unwrap()
        .is_applied());
    let status = reconciler.status();
    assert_eq!(status.state, TimerState::Begin);
    assert_eq!(status.config, short_config());
}

#[tokio::test(start_paused = true)]
async fn update_config_while_stopped_previews_on_routed_engine() {
    let reconciler = reconciler_with(Arc::new(NoopRecorder));
    let longer = TimerConfig::new(60, 20, 4, false, false, 5).unwrap();
    let mut merged = reconciler.subscribe();

    assert!(reconciler.update_config(longer).unwrap().is_applied());
    assert_eq!(reconciler.status().time_remaining_seconds, 60);
    assert_eq!(reconciler.config(), longer);
    assert_eq!(
        reconciler.background().status().config,
        TimerConfig::default()
    );

    merged.changed().await.unwrap();
    let status = merged.borrow_and_update().clone();
    assert_eq!(status.config, longer);
    assert_eq!(status.time_remaining_seconds, 60);
}
