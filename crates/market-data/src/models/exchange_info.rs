use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ExchangeError;

/// Typed view of `GET /api/v3/exchangeInfo`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangeInfo {
    #[serde(default)]
    pub symbols: Vec<SymbolInfo>,
}

/// One entry of `exchangeInfo.symbols`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub base_asset: String,
    #[serde(default)]
    pub quote_asset: String,
    #[serde(default)]
    pub status: String,
    /// Kept raw: filter entries carry type-specific keys.
    #[serde(default)]
    pub filters: Vec<Value>,
}

/// Exchange info as fetched: the raw payload and its typed view.
///
/// Shared behind an `Arc` by the catalog cache, so repeated reads within the
/// TTL hand out the very same payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeInfoPayload {
    pub raw: Value,
    pub info: ExchangeInfo,
}

impl ExchangeInfoPayload {
    pub fn from_raw(raw: Value) -> Result<Self, ExchangeError> {
        let info = ExchangeInfo::deserialize(&raw).map_err(|e| ExchangeError::Decode {
            path: "exchangeInfo".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { raw, info })
    }

    pub fn symbols(&self) -> &[SymbolInfo] {
        &self.info.symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_symbols_and_keeps_raw() {
        let raw = json!({
            "timezone": "UTC",
            "symbols": [{
                "symbol": "BTCUSDT",
                "baseAsset": "BTC",
                "quoteAsset": "USDT",
                "status": "TRADING",
                "filters": [{"filterType": "PRICE_FILTER", "tickSize": "0.01"}]
            }]
        });
        let payload = ExchangeInfoPayload::from_raw(raw.clone()).unwrap();
        assert_eq!(payload.raw, raw);
        assert_eq!(payload.symbols().len(), 1);
        let btc = &payload.symbols()[0];
        assert_eq!(btc.base_asset, "BTC");
        assert_eq!(btc.status, "TRADING");
        assert_eq!(btc.filters.len(), 1);
    }

    #[test]
    fn test_missing_symbols_is_empty() {
        let payload = ExchangeInfoPayload::from_raw(json!({})).unwrap();
        assert!(payload.symbols().is_empty());
    }

    #[test]
    fn test_wrong_shape_is_decode_error() {
        let err = ExchangeInfoPayload::from_raw(json!({"symbols": "nope"})).unwrap_err();
        assert!(matches!(err, ExchangeError::Decode { .. }));
    }
}
