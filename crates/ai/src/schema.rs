//! Structured model output and its validation.
//!
//! Model replies are untrusted: every field is checked for presence, JSON
//! type and range, and the whole settings object is rejected if any check
//! fails. All violations are reported in one message.

use bbot_core::{ConfigUpdate, TradingSettings, TradingSettingsUpdate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AiError;

/// JSON keys the model must return, in prompt order.
pub const REQUIRED_KEYS: [&str; 7] = [
    "budget_usdt",
    "max_orders",
    "grid_step_pct",
    "take_profit_pct",
    "stop_loss_pct",
    "cooldown_seconds",
    "update_interval_ms",
];

/// Validated trading parameters suggested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiSettings {
    pub budget_usdt: f64,
    pub max_orders: u32,
    pub grid_step_pct: f64,
    pub take_profit_pct: f64,
    pub stop_loss_pct: f64,
    pub cooldown_seconds: u64,
    pub update_interval_ms: u64,
}

impl AiSettings {
    /// Validate a raw settings object.
    pub fn from_value(value: &Value) -> Result<Self, AiError> {
        let object = value
            .as_object()
            .ok_or_else(|| AiError::validation("SETTINGS_JSON must be a JSON object"))?;

        let mut violations = Vec::new();
        let budget_usdt = positive_number(object, "budget_usdt", &mut violations);
        let max_orders = match integer(object, "max_orders", 1, &mut violations) {
            Some(v) => match u32::try_from(v) {
                Ok(v) => Some(v),
                Err(_) => {
                    violations.push(format!("max_orders is out of range (got {})", v));
                    None
                }
            },
            None => None,
        };
        let grid_step_pct = positive_number(object, "grid_step_pct", &mut violations);
        let take_profit_pct = positive_number(object, "take_profit_pct", &mut violations);
        let stop_loss_pct = positive_number(object, "stop_loss_pct", &mut violations);
        let cooldown_seconds = integer(object, "cooldown_seconds", 0, &mut violations);
        let update_interval_ms = integer(object, "update_interval_ms", 0, &mut violations);

        match (
            budget_usdt,
            max_orders,
            grid_step_pct,
            take_profit_pct,
            stop_loss_pct,
            cooldown_seconds,
            update_interval_ms,
        ) {
            (Some(b), Some(m), Some(g), Some(tp), Some(sl), Some(c), Some(u)) if violations.is_empty() => {
                Ok(Self {
                    budget_usdt: b,
                    max_orders: m,
                    grid_step_pct: g,
                    take_profit_pct: tp,
                    stop_loss_pct: sl,
                    cooldown_seconds: c,
                    update_interval_ms: u,
                })
            }
            _ => Err(AiError::validation(format!(
                "Invalid AI settings: {}",
                violations.join("; ")
            ))),
        }
    }

    pub fn to_trading_settings(&self) -> TradingSettings {
        TradingSettings {
            budget_usdt: self.budget_usdt,
            max_orders: self.max_orders,
            grid_step_pct: self.grid_step_pct,
            take_profit_pct: self.take_profit_pct,
            stop_loss_pct: self.stop_loss_pct,
            cooldown_seconds: self.cooldown_seconds,
            update_interval_ms: self.update_interval_ms,
        }
    }
}

fn positive_number(object: &Map<String, Value>, key: &str, violations: &mut Vec<String>) -> Option<f64> {
    match object.get(key) {
        None | Some(Value::Null) => {
            violations.push(format!("{} is required", key));
            None
        }
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) if v.is_finite() && v > 0.0 => Some(v),
            Some(v) if v.is_finite() => {
                violations.push(format!("{} must be > 0 (got {})", key, v));
                None
            }
            _ => {
                violations.push(format!("{} must be a finite number", key));
                None
            }
        },
        Some(_) => {
            violations.push(format!("{} must be a number", key));
            None
        }
    }
}

fn integer(
    object: &Map<String, Value>,
    key: &str,
    min: u64,
    violations: &mut Vec<String>,
) -> Option<u64> {
    match object.get(key) {
        None | Some(Value::Null) => {
            violations.push(format!("{} is required", key));
            None
        }
        Some(Value::Number(n)) if n.is_u64() => match n.as_u64() {
            Some(v) if v >= min => Some(v),
            Some(v) => {
                violations.push(format!("{} must be >= {} (got {})", key, min, v));
                None
            }
            None => None,
        },
        Some(Value::Number(n)) if n.is_i64() => {
            violations.push(format!("{} must be >= {} (got {})", key, min, n));
            None
        }
        Some(_) => {
            violations.push(format!("{} must be an integer", key));
            None
        }
    }
}

/// Result of one successful analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiAnalysis {
    pub explanation: String,
    pub settings: AiSettings,
}

impl AiAnalysis {
    pub fn new(explanation: impl Into<String>, settings: &Value) -> Result<Self, AiError> {
        Ok(Self {
            explanation: explanation.into(),
            settings: AiSettings::from_value(settings)?,
        })
    }

    /// Validate a structured `{explanation, settings}` reply.
    pub fn from_value(value: &Value) -> Result<Self, AiError> {
        let settings = value
            .get("settings")
            .ok_or_else(|| AiError::validation("Missing settings in AI response"))?;
        let explanation = match value.get("explanation") {
            None | Some(Value::Null) => "",
            Some(Value::String(text)) => text.trim(),
            Some(_) => return Err(AiError::validation("explanation must be a string")),
        };
        Self::new(explanation, settings)
    }

    /// Config diff that applies the suggested trading settings.
    pub fn to_config_update(&self) -> ConfigUpdate {
        let s = &self.settings;
        ConfigUpdate {
            trading: Some(TradingSettingsUpdate {
                budget_usdt: Some(s.budget_usdt),
                max_orders: Some(s.max_orders),
                grid_step_pct: Some(s.grid_step_pct),
                take_profit_pct: Some(s.take_profit_pct),
                stop_loss_pct: Some(s.stop_loss_pct),
                cooldown_seconds: Some(s.cooldown_seconds),
                update_interval_ms: Some(s.update_interval_ms),
            }),
            ..Default::default()
        }
    }
}
