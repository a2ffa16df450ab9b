//! AI pipeline error types.

use std::time::Duration;

use bbot_core::Error as CoreError;
use thiserror::Error;

/// AI pipeline errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AiError {
    /// The reply could not be split into blocks or its JSON is malformed.
    #[error("{0}")]
    Parse(String),

    /// The settings failed schema validation.
    #[error("{0}")]
    Validation(String),

    /// The backend did not answer within the per-call timeout.
    #[error("AI request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// Provider error (from rig-core or API).
    #[error("Provider error: {0}")]
    Provider(String),

    /// Missing API key for a provider.
    #[error("Missing API key for provider {0}")]
    MissingApiKey(String),

    /// Bad or incomplete configuration. Never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Every attempt failed; `last` is the final failure.
    #[error("AI analysis failed after retries")]
    RetriesExhausted { attempts: u32, last: Box<AiError> },
}

impl AiError {
    /// Create a new parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a new validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new provider error.
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Whether another attempt may succeed.
    ///
    /// Timeouts and provider failures count as validation-class failures for
    /// the retry loop.
    pub fn is_retryable(&self) -> bool {
        match self {
            AiError::Parse(_) | AiError::Validation(_) | AiError::Timeout(_) | AiError::Provider(_) => {
                true
            }
            AiError::MissingApiKey(_) | AiError::Configuration(_) | AiError::RetriesExhausted { .. } => {
                false
            }
        }
    }
}

/// Error code for programmatic handling by the shell.
impl AiError {
    pub fn code(&self) -> &'static str {
        match self {
            AiError::Parse(_) => "PARSE_ERROR",
            AiError::Validation(_) => "VALIDATION_ERROR",
            AiError::Timeout(_) => "TIMEOUT",
            AiError::Provider(_) => "PROVIDER_ERROR",
            AiError::MissingApiKey(_) => "MISSING_API_KEY",
            AiError::Configuration(_) => "CONFIGURATION_ERROR",
            AiError::RetriesExhausted { .. } => "RETRIES_EXHAUSTED",
        }
    }
}

impl From<CoreError> for AiError {
    fn from(err: CoreError) -> Self {
        AiError::Configuration(err.to_string())
    }
}
