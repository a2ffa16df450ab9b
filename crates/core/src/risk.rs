//! Conservative-profile checks on the configured risk limits.

use serde::{Deserialize, Serialize};

use crate::config::RiskSettings;

const MAX_DRAWDOWN_PCT: f64 = 30.0;
const MAX_PER_TRADE_RISK_PCT: f64 = 5.0;
const MAX_CONCURRENT_TRADES: u32 = 10;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskStatus {
    Ok,
    Warn,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub status: RiskStatus,
    pub notes: Vec<String>,
}

impl RiskReport {
    /// Notes joined for a single status line.
    pub fn summary(&self) -> String {
        if self.notes.is_empty() {
            "Risk profile accepted".to_string()
        } else {
            self.notes.join("; ")
        }
    }
}

pub fn validate_risk(settings: &RiskSettings) -> RiskReport {
    let mut notes = Vec::new();
    if settings.max_drawdown_pct > MAX_DRAWDOWN_PCT {
        notes.push("Max drawdown too high for conservative mode".to_string());
    }
    if settings.per_trade_risk_pct > MAX_PER_TRADE_RISK_PCT {
        notes.push("Per trade risk exceeds 5%".to_string());
    }
    if settings.max_concurrent_trades > MAX_CONCURRENT_TRADES {
        notes.push("Too many concurrent trades".to_string());
    }

    RiskReport {
        status: if notes.is_empty() {
            RiskStatus::Ok
        } else {
            RiskStatus::Warn
        },
        notes,
    }
}
