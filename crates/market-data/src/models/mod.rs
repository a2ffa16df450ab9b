//! Domain models for exchange metadata, fees and market snapshots.

mod exchange_info;
mod fee;
mod filters;
mod pair;
mod snapshot;

pub use exchange_info::{ExchangeInfo, ExchangeInfoPayload, SymbolInfo};
pub use fee::{FeeEntry, FeeFreeFlag, FeeMethod};
pub use filters::PairFilters;
pub use pair::{PairInfo, TRADING_STATUS};
pub use snapshot::MarketSnapshot;

use serde_json::Value;

/// Read a numeric field that the exchange may send as a string or a number.
///
/// Empty strings and unparseable values yield `None`.
pub(crate) fn number_field(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(as_number)
}

pub(crate) fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    }
}
