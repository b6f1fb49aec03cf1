//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{body::Bytes, extract::State, response::Json};
use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::{
    engine::{SessionLabel, Transition},
    error::AppError,
    services::SessionRecord,
    state::{AppState, RawTimerConfig, TimerConfig},
};
use super::responses::{
    ApiError, ApiResponse, BackgroundResponse, HealthResponse, StartRequest, StatusResponse,
};

fn respond(state: &AppState, action: &str, transition: Transition) -> Json<ApiResponse> {
    if transition == Transition::Ignored {
        warn!("{} request absorbed", action);
    }
    Json(ApiResponse::from_transition(
        action,
        transition,
        state.reconciler.status(),
    ))
}

/// Decode a JSON body, reporting malformed input as a bad request
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| AppError::InvalidRequest(e.to_string()))
}

/// Work out the config and attribution a start request asks for
fn resolve_start(
    request: StartRequest,
    current: TimerConfig,
) -> Result<(TimerConfig, SessionLabel), AppError> {
    match (request.preset, request.config) {
        (Some(preset), _) => {
            let config = preset.to_config(current.countdown_duration_seconds())?;
            let label = SessionLabel {
                exercise_name: request.exercise_name.or(preset.exercise_name),
                preset_id: Some(preset.id),
                preset_name: Some(preset.name),
            };
            Ok((config, label))
        }
        (None, Some(raw)) => Ok((
            TimerConfig::try_from(raw)?,
            SessionLabel {
                exercise_name: request.exercise_name,
                ..SessionLabel::default()
            },
        )),
        (None, None) => Ok((
            current,
            SessionLabel {
                exercise_name: request.exercise_name,
                ..SessionLabel::default()
            },
        )),
    }
}

/// Handle POST /start - Begin a session (optional config or preset body)
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ApiResponse>, ApiError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        StartRequest::default()
    } else {
        parse_body(&body)?
    };

    let (config, label) = resolve_start(request, state.reconciler.config())?;
    let transition = state.start(config, label)?;
    Ok(respond(&state, "start", transition))
}

/// Handle POST /pause
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, ApiError> {
    let transition = state.pause()?;
    Ok(respond(&state, "pause", transition))
}

/// Handle POST /resume
pub async fn resume_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, ApiError> {
    let transition = state.resume()?;
    Ok(respond(&state, "resume", transition))
}

/// Handle POST /reset
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, ApiError> {
    let transition = state.reset()?;
    Ok(respond(&state, "reset", transition))
}

/// Handle PUT /config - Replace the timer configuration
pub async fn config_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ApiResponse>, ApiError> {
    let raw: RawTimerConfig = parse_body(&body)?;
    let config = TimerConfig::try_from(raw)?;
    info!("Config update: {:?}", config);
    let transition = state.update_config(config)?;
    Ok(respond(&state, "update-config", transition))
}

/// Handle GET /status - Return the merged timer status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        timer: state.reconciler.status().into(),
        source: state.reconciler.source(),
        background_reachable: state.reconciler.background().is_reachable(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /history - Sessions recorded since startup
pub async fn history_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SessionRecord>>, ApiError> {
    Ok(Json(state.get_history()?))
}

fn background_response(state: &AppState) -> Json<BackgroundResponse> {
    Json(BackgroundResponse {
        background_reachable: state.reconciler.background().is_reachable(),
        source: state.reconciler.source(),
        timestamp: Utc::now(),
    })
}

/// Handle POST /background/attach - Foreground bound to the runner
pub async fn attach_handler(State(state): State<Arc<AppState>>) -> Json<BackgroundResponse> {
    state.attach_background();
    background_response(&state)
}

/// Handle POST /background/detach - Foreground unbound from the runner
pub async fn detach_handler(State(state): State<Arc<AppState>>) -> Json<BackgroundResponse> {
    state.detach_background();
    background_response(&state)
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
