use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::number_field;

/// Point-in-time market view for one symbol. Built fresh on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub last_price: Option<f64>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub volume_24h: Option<f64>,
    /// `ask - bid`, `None` unless both sides are known.
    pub spread: Option<f64>,
    /// Exchange-reported `closeTime` of the 24h window, in milliseconds.
    pub timestamp: Option<i64>,
}

impl MarketSnapshot {
    /// Combine a `bookTicker` and a `ticker/24hr` payload.
    pub fn from_payload(symbol: &str, book: &Value, stats: &Value) -> Self {
        let bid = number_field(book, "bidPrice");
        let ask = number_field(book, "askPrice");
        let spread = match (bid, ask) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        };

        Self {
            symbol: symbol.to_string(),
            last_price: number_field(stats, "lastPrice"),
            bid,
            ask,
            volume_24h: number_field(stats, "volume"),
            spread,
            timestamp: stats.get("closeTime").and_then(Value::as_i64),
        }
    }
}
