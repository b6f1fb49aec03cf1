//! API request and response structures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::{
    engine::{StatusSource, Transition},
    error::{AppError, ConfigError, ErrorKind, RecoveryAction},
    state::{Preset, RawTimerConfig, TimerStatus},
};

/// Body of `POST /start`. Everything is optional; an empty body starts the
/// current config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartRequest {
    pub config: Option<RawTimerConfig>,
    pub preset: Option<Preset>,
    pub exercise_name: Option<String>,
}

/// Status snapshot plus everything derived from it for display
#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    #[serde(flatten)]
    pub status: TimerStatus,
    pub can_start: bool,
    pub can_pause: bool,
    pub can_resume: bool,
    pub can_reset: bool,
    pub is_work_interval: bool,
    pub formatted_time: String,
    pub round_text: String,
    pub countdown_text: Option<String>,
    pub next_interval_preview: Option<String>,
}

impl From<TimerStatus> for StatusView {
    fn from(status: TimerStatus) -> Self {
        Self {
            can_start: status.can_start(),
            can_pause: status.can_pause(),
            can_resume: status.can_resume(),
            can_reset: status.can_reset(),
            is_work_interval: status.is_work_interval(),
            formatted_time: status.formatted_time(),
            round_text: status.round_text(),
            countdown_text: status.countdown_text(),
            next_interval_preview: status.next_interval_preview(),
            status,
        }
    }
}

/// API response structure for control endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    pub status: String,
    pub applied: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: StatusView,
}

impl ApiResponse {
    /// Describe the outcome of a control operation
    pub fn from_transition(action: &str, transition: Transition, timer: TimerStatus) -> Self {
        let (status, message) = match transition {
            Transition::Applied => ("applied", format!("{} applied", action)),
            Transition::Ignored => (
                "ignored",
                format!("{} ignored in state {}", action, timer.state),
            ),
        };
        Self {
            status: status.to_string(),
            applied: transition.is_applied(),
            message,
            timestamp: Utc::now(),
            timer: timer.into(),
        }
    }
}

/// Status response with server information
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub timer: StatusView,
    pub source: StatusSource,
    pub background_reachable: bool,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Connectivity change response
#[derive(Debug, Clone, Serialize)]
pub struct BackgroundResponse {
    pub background_reachable: bool,
    pub source: StatusSource,
    pub timestamp: DateTime<Utc>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    pub kind: ErrorKind,
    pub recovery: RecoveryAction,
    pub timestamp: DateTime<Utc>,
}

/// Error wrapper turning [`AppError`] into an HTTP response
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if !self.0.is_user_visible() {
            error!("Request failed: {} ({:?})", self.0, self.0.recovery());
        }
        let code = match self.0.kind() {
            ErrorKind::Configuration => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            status: "error".to_string(),
            message: self.0.to_string(),
            kind: self.0.kind(),
            recovery: self.0.recovery(),
            timestamp: Utc::now(),
        };
        (code, Json(body)).into_response()
    }
}
