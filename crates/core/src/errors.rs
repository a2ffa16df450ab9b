//! Core error types for the BBOT copilot.
//!
//! Exchange and AI failures have their own enums in the sibling crates.
//! This module covers configuration and state transitions, which every layer
//! shares.

use thiserror::Error;

use crate::state::AppState;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the core crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to load configuration: {0}")]
    ConfigIO(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    #[error("Missing configuration key: {0}")]
    MissingConfigKey(String),

    #[error("Transition {from} -> {to} is not allowed")]
    IllegalTransition { from: AppState, to: AppState },
}

impl Error {
    /// Configuration problems are fatal for the current operation: the shell
    /// must surface them instead of retrying.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ConfigIO(_) | Error::InvalidConfigValue(_) | Error::MissingConfigKey(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigIO(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::ConfigIO(err.to_string())
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_fatal() {
        assert!(Error::MissingConfigKey("ai.model".into()).is_fatal());
        assert!(Error::InvalidConfigValue("ai.temperature".into()).is_fatal());
        assert!(!Error::IllegalTransition {
            from: AppState::Idle,
            to: AppState::Running
        }
        .is_fatal());
    }

    #[test]
    fn test_illegal_transition_display() {
        let err = Error::IllegalTransition {
            from: AppState::Idle,
            to: AppState::Running,
        };
        assert_eq!(err.to_string(), "Transition IDLE -> RUNNING is not allowed");
    }
}
