use serde::{Deserialize, Serialize};

use super::{FeeFreeFlag, PairFilters, SymbolInfo};

/// Exchange status of a symbol open for trading.
pub const TRADING_STATUS: &str = "TRADING";

/// A classified trading pair built from one exchange-info snapshot.
///
/// Fields are private: a refresh produces new `PairInfo` values instead of
/// mutating existing ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairInfo {
    symbol: String,
    base: String,
    quote: String,
    status: String,
    filters: PairFilters,
    fee: FeeFreeFlag,
}

impl PairInfo {
    pub fn from_symbol(symbol: &SymbolInfo, fee: FeeFreeFlag) -> Self {
        Self {
            symbol: symbol.symbol.clone(),
            base: symbol.base_asset.clone(),
            quote: symbol.quote_asset.clone(),
            status: symbol.status.clone(),
            filters: PairFilters::from_filters(&symbol.filters),
            fee,
        }
    }

    pub(crate) fn from_parts(
        symbol: &str,
        base: &str,
        quote: &str,
        status: &str,
        fee: FeeFreeFlag,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            base: base.to_string(),
            quote: quote.to_string(),
            status: status.to_string(),
            filters: PairFilters::default(),
            fee,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn is_trading(&self) -> bool {
        self.status == TRADING_STATUS
    }

    pub fn filters(&self) -> &PairFilters {
        &self.filters
    }

    pub fn fee(&self) -> &FeeFreeFlag {
        &self.fee
    }

    pub fn is_fee_free(&self) -> bool {
        self.fee.fee_free
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FeeMethod;
    use serde_json::json;

    fn btc_usdt() -> SymbolInfo {
        SymbolInfo {
            symbol: "BTCUSDT".to_string(),
            base_asset: "BTC".to_string(),
            quote_asset: "USDT".to_string(),
            status: "TRADING".to_string(),
            filters: vec![
                json!({"filterType": "PRICE_FILTER", "tickSize": "0.01"}),
                json!({"filterType": "LOT_SIZE", "stepSize": "0.001"}),
                json!({"filterType": "MIN_NOTIONAL", "minNotional": "10"}),
            ],
        }
    }

    #[test]
    fn test_from_exchange_info_entry() {
        let pair = PairInfo::from_symbol(&btc_usdt(), FeeFreeFlag::standard());
        assert_eq!(pair.symbol(), "BTCUSDT");
        assert_eq!(pair.base(), "BTC");
        assert_eq!(pair.quote(), "USDT");
        assert_eq!(pair.status(), "TRADING");
        assert!(pair.is_trading());
        assert_eq!(pair.filters().tick_size, Some(0.01));
        assert_eq!(pair.filters().step_size, Some(0.001));
        assert_eq!(pair.filters().min_notional, Some(10.0));
        assert!(!pair.is_fee_free());
    }

    #[test]
    fn test_halted_symbol_is_not_trading() {
        let symbol = SymbolInfo {
            status: "BREAK".to_string(),
            ..btc_usdt()
        };
        assert!(!PairInfo::from_symbol(&symbol, FeeFreeFlag::standard()).is_trading());
    }

    #[test]
    fn test_fee_flag_is_carried() {
        let flag = FeeFreeFlag::new(true, FeeMethod::Heuristic, Some("Quote whitelisted"));
        let pair = PairInfo::from_symbol(&btc_usdt(), flag.clone());
        assert!(pair.is_fee_free());
        assert_eq!(pair.fee(), &flag);
    }
}
