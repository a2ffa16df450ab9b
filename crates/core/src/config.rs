//! Configuration snapshot consumed by the core services.
//!
//! The shell owns persistence. Core code reads an immutable [`Config`] and
//! produces changes as a [`ConfigUpdate`]; [`Config::apply`] returns a new
//! snapshot and never mutates the one it was called on.

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";
pub const TESTNET_BASE_URL: &str = "https://testnet.binance.vision";
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// General application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// `mock` or `live`.
    pub mode: String,
    pub active_pair: String,
    pub exchange: String,
    pub testnet: bool,
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            mode: "mock".to_string(),
            active_pair: "BTCUSDT".to_string(),
            exchange: "binance".to_string(),
            testnet: true,
            log_level: "INFO".to_string(),
        }
    }
}

/// Credentials passed through to the exchange and the model backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub exchange_key: String,
    pub exchange_secret: String,
    pub openai_key: String,
}

impl ApiKeys {
    /// Copy with every secret shortened for display.
    pub fn masked(&self) -> ApiKeys {
        let mask = |value: &str| {
            if value.is_empty() {
                String::new()
            } else {
                format!("{}***", value.chars().take(3).collect::<String>())
            }
        };
        ApiKeys {
            exchange_key: mask(&self.exchange_key),
            exchange_secret: mask(&self.exchange_secret),
            openai_key: mask(&self.openai_key),
        }
    }

    pub fn exchange_key(&self) -> Option<&str> {
        non_empty(&self.exchange_key)
    }

    pub fn openai_key(&self) -> Option<&str> {
        non_empty(&self.openai_key)
    }
}

/// Exchange REST client settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeSettings {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub cache_ttl_seconds: u64,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 10,
            max_retries: 3,
            cache_ttl_seconds: 900,
        }
    }
}

/// Model backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub model: String,
    pub temperature: f64,
    pub timeout_seconds: u64,
    pub max_retries: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.2,
            timeout_seconds: 20,
            max_retries: 2,
        }
    }
}

/// Fee-free detection inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairSettings {
    /// Symbols the operator marks as fee-free.
    pub manual_fee_free: Vec<String>,
    /// Quote assets treated as fee-free when the exchange reports nothing.
    pub heuristic_quote_whitelist: Vec<String>,
}

impl Default for PairSettings {
    fn default() -> Self {
        Self {
            manual_fee_free: Vec::new(),
            heuristic_quote_whitelist: vec!["FDUSD".to_string()],
        }
    }
}

/// Trading parameters, in the same shape the AI pipeline suggests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingSettings {
    pub budget_usdt: f64,
    pub max_orders: u32,
    pub grid_step_pct: f64,
    pub take_profit_pct: f64,
    pub stop_loss_pct: f64,
    pub cooldown_seconds: u64,
    pub update_interval_ms: u64,
}

impl Default for TradingSettings {
    fn default() -> Self {
        Self {
            budget_usdt: 100.0,
            max_orders: 3,
            grid_step_pct: 0.5,
            take_profit_pct: 3.0,
            stop_loss_pct: 1.5,
            cooldown_seconds: 10,
            update_interval_ms: 1000,
        }
    }
}

/// Risk profile limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSettings {
    pub max_drawdown_pct: f64,
    pub per_trade_risk_pct: f64,
    pub max_concurrent_trades: u32,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            max_drawdown_pct: 15.0,
            per_trade_risk_pct: 2.0,
            max_concurrent_trades: 3,
        }
    }
}

/// Complete configuration snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub app: AppSettings,
    pub api_keys: ApiKeys,
    pub exchange: ExchangeSettings,
    pub ai: AiConfig,
    pub pairs: PairSettings,
    pub trading: TradingSettings,
    pub risk: RiskSettings,
}

impl Config {
    /// Parse and validate a JSON document. Missing sections take defaults.
    pub fn from_json_str(raw: &str) -> Result<Config> {
        let config: Config = serde_json::from_str(raw)
            .map_err(|e| Error::InvalidConfigValue(format!("config validation error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check values that serde alone cannot.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.app.mode.as_str(), "mock" | "live") {
            return Err(Error::InvalidConfigValue(format!(
                "app.mode must be 'mock' or 'live', got '{}'",
                self.app.mode
            )));
        }
        if self.exchange.base_url.trim().is_empty() {
            return Err(Error::MissingConfigKey("exchange.base_url".to_string()));
        }
        if self.exchange.timeout_seconds == 0 {
            return Err(Error::InvalidConfigValue(
                "exchange.timeout_seconds must be positive".to_string(),
            ));
        }
        if self.ai.model.trim().is_empty() {
            return Err(Error::MissingConfigKey("ai.model".to_string()));
        }
        if !(0.0..=2.0).contains(&self.ai.temperature) {
            return Err(Error::InvalidConfigValue(format!(
                "ai.temperature must be within 0..=2, got {}",
                self.ai.temperature
            )));
        }
        if self.ai.timeout_seconds == 0 {
            return Err(Error::InvalidConfigValue(
                "ai.timeout_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// REST endpoint to talk to. With `app.testnet` set, the default mainnet
    /// URL is swapped for the testnet one; a custom `base_url` always wins.
    pub fn exchange_base_url(&self) -> &str {
        let base_url = self.exchange.base_url.trim().trim_end_matches('/');
        if self.app.testnet && base_url == DEFAULT_BASE_URL {
            TESTNET_BASE_URL
        } else {
            base_url
        }
    }

    /// Return a new snapshot with `update` applied.
    pub fn apply(&self, update: &ConfigUpdate) -> Config {
        let mut next = self.clone();

        if let Some(pair) = &update.active_pair {
            next.app.active_pair = pair.clone();
        }
        if let Some(mode) = &update.mode {
            next.app.mode = mode.clone();
        }
        if let Some(manual) = &update.manual_fee_free {
            next.pairs.manual_fee_free = manual.clone();
        }
        if let Some(quotes) = &update.heuristic_quote_whitelist {
            next.pairs.heuristic_quote_whitelist = quotes.clone();
        }
        if let Some(trading) = &update.trading {
            trading.apply_to(&mut next.trading);
        }
        next
    }
}

/// Partial change to a [`Config`]. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigUpdate {
    pub active_pair: Option<String>,
    pub mode: Option<String>,
    pub manual_fee_free: Option<Vec<String>>,
    pub heuristic_quote_whitelist: Option<Vec<String>>,
    pub trading: Option<TradingSettingsUpdate>,
}

impl ConfigUpdate {
    pub fn is_empty(&self) -> bool {
        self == &ConfigUpdate::default()
    }
}

/// Partial change to [`TradingSettings`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingSettingsUpdate {
    pub budget_usdt: Option<f64>,
    pub max_orders: Option<u32>,
    pub grid_step_pct: Option<f64>,
    pub take_profit_pct: Option<f64>,
    pub stop_loss_pct: Option<f64>,
    pub cooldown_seconds: Option<u64>,
    pub update_interval_ms: Option<u64>,
}

impl TradingSettingsUpdate {
    fn apply_to(&self, target: &mut TradingSettings) {
        if let Some(v) = self.budget_usdt {
            target.budget_usdt = v;
        }
        if let Some(v) = self.max_orders {
            target.max_orders = v;
        }
        if let Some(v) = self.grid_step_pct {
            target.grid_step_pct = v;
        }
        if let Some(v) = self.take_profit_pct {
            target.take_profit_pct = v;
        }
        if let Some(v) = self.stop_loss_pct {
            target.stop_loss_pct = v;
        }
        if let Some(v) = self.cooldown_seconds {
            target.cooldown_seconds = v;
        }
        if let Some(v) = self.update_interval_ms {
            target.update_interval_ms = v;
        }
    }
}

/// Shorten a secret for log output: first three and last two characters.
pub fn mask_secret(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = value.chars().collect();
    let head: String = chars.iter().take(3).collect();
    let tail: String = chars[chars.len().saturating_sub(2)..].iter().collect();
    format!("{}***{}", head, tail)
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
