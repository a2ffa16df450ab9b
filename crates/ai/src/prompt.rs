//! System prompt for settings analysis.

use std::fmt::Display;

use bbot_core::Config;
use bbot_market_data::{MarketSnapshot, PairFilters};

use crate::parser::{EXPLANATION_ANCHOR, SETTINGS_ANCHOR};
use crate::schema::REQUIRED_KEYS;

const DEFAULT_CONSTRAINT: &str = "- Follow Binance trading rules";

/// Build the system prompt from the config snapshot and optional market data.
pub fn build_prompt(
    config: &Config,
    snapshot: Option<&MarketSnapshot>,
    filters: Option<&PairFilters>,
    constraints: &[(String, String)],
) -> String {
    let pair = if config.app.active_pair.trim().is_empty() {
        "(not selected)"
    } else {
        config.app.active_pair.as_str()
    };

    let market = match snapshot {
        Some(s) => format!(
            "Last: {} | Bid: {} | Ask: {} | Spread: {}\nVol24h: {} | Timestamp: {}",
            opt(s.last_price),
            opt(s.bid),
            opt(s.ask),
            opt(s.spread),
            opt(s.volume_24h),
            opt(s.timestamp),
        ),
        None => "Market snapshot unavailable".to_string(),
    };

    let filter_line = match filters {
        Some(f) => format!(
            "tickSize={} stepSize={} minNotional={}",
            opt(f.tick_size),
            opt(f.step_size),
            opt(f.min_notional)
        ),
        None => "No filters".to_string(),
    };

    let constraint_block = if constraints.is_empty() {
        DEFAULT_CONSTRAINT.to_string()
    } else {
        constraints
            .iter()
            .map(|(key, value)| format!("- {}: {}", key, value))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let current_settings = serde_json::to_string(&config.trading).unwrap_or_default();

    [
        format!(
            "You are BBOT AI copilot. Respond with two sections: '{}' and '{}'.",
            EXPLANATION_ANCHOR, SETTINGS_ANCHOR
        ),
        "You must produce JSON that matches the schema exactly.".to_string(),
        format!("Active pair: {}", pair),
        "Market:".to_string(),
        market,
        "Filters:".to_string(),
        filter_line,
        "Current settings:".to_string(),
        current_settings,
        "Constraints:".to_string(),
        constraint_block,
        format!("Required JSON keys: {}", REQUIRED_KEYS.join(", ")),
        "Be concise and professional.".to_string(),
    ]
    .join("\n")
}

fn opt<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}
