//! Rate-limited REST client for the exchange.
//!
//! Every request goes through [`RateLimitedHttpClient::get_json`], which
//! - waits out an active cooldown before each attempt,
//! - arms the cooldown from `Retry-After` on HTTP 429/418 and retries,
//! - retries other failures with exponential backoff (1s, 2s, 4s, ...),
//! - gives up after `max_retries` retries and returns the last error.
//!
//! The client is meant for a single owner: methods take `&mut self` and an
//! awaited call occupies the caller for its full duration, sleeps included.

mod cooldown;
mod transport;

pub use cooldown::Cooldown;
pub use transport::{
    HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, MAX_RETRY_AFTER,
};

use std::sync::Arc;
use std::time::Duration;

use bbot_core::{ApiKeys, Config, ExchangeSettings};
use chrono::Utc;
use log::warn;
use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use crate::errors::{ExchangeError, RetryClass};
use crate::models::FeeEntry;

pub const EXCHANGE_INFO_PATH: &str = "/api/v3/exchangeInfo";
pub const TICKER_24H_PATH: &str = "/api/v3/ticker/24hr";
pub const BOOK_TICKER_PATH: &str = "/api/v3/ticker/bookTicker";
pub const SERVER_TIME_PATH: &str = "/api/v3/time";
pub const TRADE_FEE_PATH: &str = "/sapi/v1/asset/tradeFee";

const API_KEY_HEADER: &str = "X-MBX-APIKEY";
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Client settings.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    /// Passed through as a header; requests are never signed.
    pub api_key: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from_settings(&ExchangeSettings::default(), &ApiKeys::default())
    }
}

impl HttpClientConfig {
    pub fn from_settings(settings: &ExchangeSettings, keys: &ApiKeys) -> Self {
        Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(settings.timeout_seconds),
            max_retries: settings.max_retries,
            initial_backoff: Duration::from_secs(1),
            api_key: keys.exchange_key().map(str::to_string),
        }
    }

    /// Settings from a full snapshot, honouring `app.testnet`.
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.exchange_base_url().to_string(),
            ..Self::from_settings(&config.exchange, &config.api_keys)
        }
    }
}

pub struct RateLimitedHttpClient {
    transport: Arc<dyn HttpTransport>,
    config: HttpClientConfig,
    cooldown: Cooldown,
    last_latency: Option<Duration>,
}

impl RateLimitedHttpClient {
    /// Client backed by `reqwest`.
    pub fn new(config: HttpClientConfig) -> Self {
        let transport = Arc::new(ReqwestTransport::new(config.timeout));
        Self::with_transport(config, transport)
    }

    pub fn with_transport(config: HttpClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            config: HttpClientConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
            cooldown: Cooldown::new(),
            last_latency: None,
        }
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Latency of the most recent successful request, in milliseconds.
    pub fn last_latency_ms(&self) -> Option<f64> {
        self.last_latency.map(|d| d.as_secs_f64() * 1000.0)
    }

    /// Time left on the rate-limit cooldown.
    pub fn cooldown_remaining(&self) -> Duration {
        self.cooldown.remaining()
    }

    fn build_request(&self, path: &str, params: &[(&str, &str)]) -> HttpRequest {
        let mut headers = Vec::new();
        if let Some(key) = &self.config.api_key {
            headers.push((API_KEY_HEADER.to_string(), key.clone()));
        }
        HttpRequest {
            url: format!("{}{}", self.config.base_url, path),
            query: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            headers,
        }
    }

    /// GET `path` and decode the body as JSON.
    pub async fn get_json(
        &mut self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, ExchangeError> {
        let request = self.build_request(path, params);
        let max_retries = self.config.max_retries;
        let mut retries_used = 0u32;
        let mut backoff = self.config.initial_backoff;

        loop {
            self.cooldown.wait().await;

            debug!("Exchange request: {} with {} params", path, params.len());
            let started = Instant::now();
            let error = match self.transport.get(&request).await {
                Ok(response) if response.is_success() => {
                    self.last_latency = Some(started.elapsed());
                    return serde_json::from_str(&response.body).map_err(|e| {
                        ExchangeError::Decode {
                            path: path.to_string(),
                            message: e.to_string(),
                        }
                    });
                }
                Ok(response) if response.is_rate_limited() => {
                    let wait = response.retry_after().unwrap_or(backoff);
                    self.cooldown.arm(wait);
                    warn!(
                        "Exchange rate limit hit ({}), cooling down {:?}",
                        response.status, wait
                    );
                    ExchangeError::RateLimited {
                        status: response.status,
                        retry_after: wait,
                    }
                }
                Ok(response) => ExchangeError::Http {
                    status: response.status,
                    message: truncate(&response.body, MAX_ERROR_BODY_CHARS),
                },
                Err(e) => e,
            };

            let class = error.retry_class();
            if class == RetryClass::Never || retries_used >= max_retries {
                warn!(
                    "Exchange request {} failed after {} attempt(s): {}",
                    path,
                    retries_used + 1,
                    error
                );
                return Err(error.into_terminal());
            }
            retries_used += 1;

            match class {
                // The cooldown wait at the top of the loop does the sleeping.
                RetryClass::Cooldown => {}
                _ => {
                    warn!(
                        "Exchange request {} failed (retry {}/{}), backing off {:?}: {}",
                        path, retries_used, max_retries, backoff, error
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
            backoff = backoff.saturating_mul(2);
        }
    }

    pub async fn fetch_exchange_info(&mut self) -> Result<Value, ExchangeError> {
        self.get_json(EXCHANGE_INFO_PATH, &[]).await
    }

    /// 24h statistics for one symbol, or for all symbols when `None`.
    pub async fn fetch_ticker_24h(&mut self, symbol: Option<&str>) -> Result<Value, ExchangeError> {
        match symbol {
            Some(symbol) => self.get_json(TICKER_24H_PATH, &[("symbol", symbol)]).await,
            None => self.get_json(TICKER_24H_PATH, &[]).await,
        }
    }

    pub async fn fetch_book_ticker(&mut self, symbol: &str) -> Result<Value, ExchangeError> {
        self.get_json(BOOK_TICKER_PATH, &[("symbol", symbol)]).await
    }

    pub async fn fetch_all_book_tickers(&mut self) -> Result<Value, ExchangeError> {
        self.get_json(BOOK_TICKER_PATH, &[]).await
    }

    pub async fn fetch_time(&mut self) -> Result<Value, ExchangeError> {
        self.get_json(SERVER_TIME_PATH, &[]).await
    }

    /// Trade fee rows. Requires an API key on the real exchange.
    pub async fn fetch_trade_fees(&mut self) -> Result<Vec<FeeEntry>, ExchangeError> {
        let payload = self.get_json(TRADE_FEE_PATH, &[]).await?;
        match payload {
            Value::Array(rows) => Ok(rows.iter().map(FeeEntry::from_value).collect()),
            other => Err(ExchangeError::Decode {
                path: TRADE_FEE_PATH.to_string(),
                message: format!("expected an array, got {}", json_kind(&other)),
            }),
        }
    }

    /// Estimated `server - client` clock offset in milliseconds.
    pub async fn measure_time_offset(&mut self) -> Result<i64, ExchangeError> {
        let client_start = Utc::now().timestamp_millis();
        let payload = self.fetch_time().await?;
        let client_end = Utc::now().timestamp_millis();
        let server_time = payload.get("serverTime").and_then(Value::as_i64);
        Ok(estimate_time_offset(server_time, client_start, client_end))
    }
}

/// `server_time - client_end + round_trip / 2`, or 0 without a server time.
pub fn estimate_time_offset(server_time: Option<i64>, client_start: i64, client_end: i64) -> i64 {
    match server_time {
        Some(server_time) => server_time - client_end + (client_end - client_start) / 2,
        None => 0,
    }
}

fn truncate(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        body.to_string()
    } else {
        format!("{}...", body.chars().take(max_chars).collect::<String>())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
