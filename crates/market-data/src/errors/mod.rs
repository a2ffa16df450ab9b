//! Error types and retry classification for the exchange data-access layer.
//!
//! This module provides:
//! - [`ExchangeError`]: The main error enum for all exchange operations
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while talking to the exchange.
///
/// Each variant is classified into a [`RetryClass`] via the
/// [`retry_class`](Self::retry_class) method, which the HTTP client uses to
/// drive its retry loop.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeError {
    /// Connection-level failure (DNS, TLS, reset, ...).
    #[error("Network error: {message}")]
    Network {
        /// Description from the transport
        message: String,
    },

    /// The request did not complete within the client timeout.
    #[error("Timeout: {url}")]
    Timeout {
        /// The URL that timed out
        url: String,
    },

    /// The exchange answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        message: String,
    },

    /// The exchange rate limited the request (HTTP 429, or 418 once banned).
    #[error("Rate limited (HTTP {status}), retry after {}s", retry_after.as_secs_f64())]
    RateLimited {
        /// HTTP status code
        status: u16,
        /// Cooldown applied before the next attempt
        retry_after: Duration,
    },

    /// The response body could not be decoded.
    #[error("Failed to decode {path}: {message}")]
    Decode {
        /// Endpoint path
        path: String,
        /// Decoder message
        message: String,
    },

    /// Exchange info contained no usable symbols.
    #[error("No pairs returned from exchange")]
    NoPairsReturned,

    /// Credentials were missing or rejected (HTTP 401/403).
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

impl ExchangeError {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use bbot_market_data::errors::{ExchangeError, RetryClass};
    ///
    /// let error = ExchangeError::Network { message: "connection reset".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = ExchangeError::NoPairsReturned;
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            // Transient errors - retry with backoff
            Self::Network { .. } | Self::Timeout { .. } | Self::Http { .. } => {
                RetryClass::WithBackoff
            }

            // Exchange-imposed pause
            Self::RateLimited { .. } => RetryClass::Cooldown,

            // Terminal errors - retrying won't help
            Self::Decode { .. } | Self::NoPairsReturned | Self::PermissionDenied(_) => {
                RetryClass::Never
            }
        }
    }

    /// True for failures of the network/transport class, which the shell
    /// reports as "exchange unreachable".
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Timeout { .. } | Self::Http { .. }
        )
    }

    /// Final form of an error once the retry budget is spent.
    ///
    /// Authorization failures are surfaced as [`ExchangeError::PermissionDenied`].
    pub(crate) fn into_terminal(self) -> Self {
        match self {
            Self::Http { status, message } if status == 401 || status == 403 => {
                Self::PermissionDenied(format!("HTTP {}: {}", status, message))
            }
            other => other,
        }
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: err
                    .url()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| "<unknown>".to_string()),
            }
        } else {
            Self::Network {
                message: err.to_string(),
            }
        }
    }
}
