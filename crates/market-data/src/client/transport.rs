//! HTTP transport abstraction.
//!
//! The rate-limited client only needs "send a GET, hand me status, headers and
//! body". Keeping that behind a trait lets tests script exchange responses
//! without a network.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use log::error;
use reqwest::Client;

use crate::errors::ExchangeError;

/// Upper bound on a server-supplied `Retry-After` hint.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(300);

/// A GET request as seen by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

/// A response with header names lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// HTTP 429, or 418 which the exchange sends once an IP is banned.
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429 || self.status == 418
    }

    /// `Retry-After` in seconds, if present and numeric, capped at
    /// [`MAX_RETRY_AFTER`].
    pub fn retry_after(&self) -> Option<Duration> {
        let raw = self.header("retry-after")?.trim();
        let wait = match raw.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                let secs = raw.parse::<f64>().ok()?;
                if secs.is_nan() || secs < 0.0 {
                    return None;
                }
                // Out of range for a Duration means "longer than the cap".
                Duration::try_from_secs_f64(secs).unwrap_or(MAX_RETRY_AFTER)
            }
        };
        Some(wait.min(MAX_RETRY_AFTER))
    }
}

/// Sends GET requests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform the request. Non-2xx statuses are returned as responses, not
    /// errors; only transport-level failures are `Err`.
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, ExchangeError>;
}

/// Production transport on top of `reqwest`.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn try_new(timeout: Duration) -> Result<Self, ExchangeError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Like [`ReqwestTransport::try_new`], but falls back to a default client,
    /// without the request timeout, when the builder fails.
    pub fn new(timeout: Duration) -> Self {
        Self::try_new(timeout).unwrap_or_else(|e| {
            error!(
                "Failed to build HTTP client with {:?} timeout, using defaults: {}",
                timeout, e
            );
            Self {
                client: Client::new(),
            }
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, ExchangeError> {
        let mut builder = self.client.get(&request.url).query(&request.query);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
