//! Error taxonomy
//!
//! Every failure the crate can report is a tagged variant that knows which
//! domain it came from and what the caller is expected to do about it.

use serde::Serialize;
use thiserror::Error;

/// A timer configuration field was outside its valid domain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} must be between {min} and {max} (got {value})")]
pub struct ConfigError {
    pub field: &'static str,
    pub min: u32,
    pub max: u32,
    pub value: u32,
}

/// Domain an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Timer,
    Audio,
    Database,
    Configuration,
    Runtime,
}

/// What the caller should do after an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    Retry,
    Fallback,
    Restart,
    ShowMessage,
    Continue,
    Fatal,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid timer configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("timer engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("background runner unreachable")]
    BackgroundUnreachable,

    #[error("audio cue delivery failed: {0}")]
    Audio(String),

    #[error("session history unavailable: {0}")]
    History(String),

    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidConfig(_) | AppError::InvalidRequest(_) => ErrorKind::Configuration,
            AppError::EngineUnavailable(_) | AppError::BackgroundUnreachable => ErrorKind::Timer,
            AppError::Audio(_) => ErrorKind::Audio,
            AppError::History(_) => ErrorKind::Database,
            AppError::Runtime(_) => ErrorKind::Runtime,
        }
    }

    pub fn recovery(&self) -> RecoveryAction {
        match self {
            AppError::InvalidConfig(_) | AppError::InvalidRequest(_) => RecoveryAction::ShowMessage,
            AppError::EngineUnavailable(_) => RecoveryAction::Restart,
            AppError::BackgroundUnreachable => RecoveryAction::Fallback,
            AppError::Audio(_) => RecoveryAction::Continue,
            AppError::History(_) => RecoveryAction::Retry,
            AppError::Runtime(_) => RecoveryAction::Fatal,
        }
    }

    /// Whether the error should reach the interface layer as a message.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self.recovery(),
            RecoveryAction::ShowMessage | RecoveryAction::Fatal
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_names_field_and_range() {
        let err = ConfigError {
            field: "work_time_seconds",
            min: 5,
            max: 900,
            value: 2,
        };
        assert_eq!(
            err.to_string(),
            "work_time_seconds must be between 5 and 900 (got 2)"
        );
    }

    #[test]
    fn recovery_actions_by_variant() {
        let config: AppError = ConfigError {
            field: "total_rounds",
            min: 1,
            max: 99,
            value: 0,
        }
        .into();
        assert_eq!(config.kind(), ErrorKind::Configuration);
        assert_eq!(config.recovery(), RecoveryAction::ShowMessage);
        assert!(config.is_user_visible());

        let unreachable = AppError::BackgroundUnreachable;
        assert_eq!(unreachable.recovery(), RecoveryAction::Fallback);
        assert!(!unreachable.is_user_visible());

        let audio = AppError::Audio("lagged".to_string());
        assert_eq!(audio.kind(), ErrorKind::Audio);
        assert_eq!(audio.recovery(), RecoveryAction::Continue);

        let history = AppError::History("poisoned".to_string());
        assert_eq!(history.kind(), ErrorKind::Database);
        assert_eq!(history.recovery(), RecoveryAction::Retry);
    }
}
