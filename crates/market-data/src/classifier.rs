//! Fee-free pair detection.
//!
//! Evaluation order is fixed: exchange-reported zero fees, then the trusted
//! quote-asset whitelist, then the operator's symbol whitelist. The first
//! match wins.

use std::collections::HashSet;

use bbot_core::PairSettings;

use crate::models::{FeeEntry, FeeFreeFlag, FeeMethod};

/// Whitelists used by [`classify`]. Entries are stored upper-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeeFreeRules {
    manual_symbols: HashSet<String>,
    heuristic_quotes: HashSet<String>,
}

impl FeeFreeRules {
    pub fn new<M, H, S, T>(manual_symbols: M, heuristic_quotes: H) -> Self
    where
        M: IntoIterator<Item = S>,
        H: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Self {
            manual_symbols: manual_symbols
                .into_iter()
                .map(|s| s.as_ref().trim().to_uppercase())
                .collect(),
            heuristic_quotes: heuristic_quotes
                .into_iter()
                .map(|q| q.as_ref().trim().to_uppercase())
                .collect(),
        }
    }

    pub fn from_settings(settings: &PairSettings) -> Self {
        Self::new(&settings.manual_fee_free, &settings.heuristic_quote_whitelist)
    }

    pub fn is_manual(&self, symbol: &str) -> bool {
        self.manual_symbols.contains(&symbol.to_uppercase())
    }

    pub fn is_heuristic_quote(&self, quote_asset: &str) -> bool {
        self.heuristic_quotes.contains(&quote_asset.to_uppercase())
    }
}

/// Decide whether a pair trades without commission.
pub fn classify(
    symbol: &str,
    quote_asset: &str,
    fee_entry: Option<&FeeEntry>,
    rules: &FeeFreeRules,
) -> FeeFreeFlag {
    if fee_entry.is_some_and(FeeEntry::is_zero_fee) {
        return FeeFreeFlag::new(true, FeeMethod::Api, Some("Exchange tradeFee=0"));
    }
    if rules.is_heuristic_quote(quote_asset) {
        return FeeFreeFlag::new(true, FeeMethod::Heuristic, Some("Quote whitelisted"));
    }
    if rules.is_manual(symbol) {
        return FeeFreeFlag::new(true, FeeMethod::Manual, Some("User whitelist"));
    }
    FeeFreeFlag::standard()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn zero_fee(symbol: &str) -> FeeEntry {
        FeeEntry::from_value(&json!({"symbol": symbol, "makerCommission": "0", "takerCommission": "0"}))
    }

    fn paid_fee(symbol: &str) -> FeeEntry {
        FeeEntry::from_value(&json!({"symbol": symbol, "maker": "0.001", "taker": "0.001"}))
    }

    #[test]
    fn test_api_zero_fee_wins() {
        let rules = FeeFreeRules::new(["BTCFDUSD"], ["FDUSD"]);
        let flag = classify("BTCFDUSD", "FDUSD", Some(&zero_fee("BTCFDUSD")), &rules);
        assert_eq!(flag.method, FeeMethod::Api);
        assert!(flag.fee_free);
        assert_eq!(flag.notes.as_deref(), Some("Exchange tradeFee=0"));
    }

    #[test]
    fn test_nonzero_fee_falls_through_to_heuristic() {
        let rules = FeeFreeRules::new(Vec::<String>::new(), ["fdusd"]);
        let flag = classify("ETHFDUSD", "FDUSD", Some(&paid_fee("ETHFDUSD")), &rules);
        assert_eq!(flag.method, FeeMethod::Heuristic);
    }

    #[test]
    fn test_heuristic_is_quote_level_and_case_insensitive() {
        let rules = FeeFreeRules::new(Vec::<String>::new(), ["FDUSD"]);
        assert_eq!(classify("BTCFDUSD", "fdusd", None, &rules).method, FeeMethod::Heuristic);
        // The symbol containing the quote is not enough.
        assert_eq!(classify("FDUSDUSDT", "USDT", None, &rules).method, FeeMethod::Standard);
    }

    #[test]
    fn test_manual_whitelist() {
        let rules = FeeFreeRules::new(["btcusdt"], Vec::<String>::new());
        let flag = classify("BTCUSDT", "USDT", None, &rules);
        assert_eq!(flag.method, FeeMethod::Manual);
        assert_eq!(flag.notes.as_deref(), Some("User whitelist"));
    }

    #[test]
    fn test_standard_fallback() {
        let flag = classify("BTCUSDT", "USDT", Some(&paid_fee("BTCUSDT")), &FeeFreeRules::default());
        assert_eq!(flag, FeeFreeFlag::standard());
    }

    #[test]
    fn test_rules_from_settings() {
        let settings = PairSettings {
            manual_fee_free: vec![" ethusdt ".to_string()],
            heuristic_quote_whitelist: vec!["FDUSD".to_string()],
        };
        let rules = FeeFreeRules::from_settings(&settings);
        assert!(rules.is_manual("ETHUSDT"));
        assert!(rules.is_heuristic_quote("fdusd"));
    }

    fn arb_asset() -> impl Strategy<Value = String> {
        "[A-Z]{2,6}"
    }

    fn arb_zero_commission() -> impl Strategy<Value = serde_json::Value> {
        prop_oneof![
            Just(json!("0")),
            Just(json!("0.0000")),
            Just(json!(0)),
            Just(json!(0.0)),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A zero-fee entry yields API whatever the whitelists contain.
        #[test]
        fn prop_zero_fee_entry_is_always_api(
            base in arb_asset(),
            quote in arb_asset(),
            maker in arb_zero_commission(),
            taker in arb_zero_commission(),
            long_names in any::<bool>(),
            in_manual in any::<bool>(),
            in_heuristic in any::<bool>(),
        ) {
            let symbol = format!("{}{}", base, quote);
            let entry = if long_names {
                json!({"symbol": symbol, "makerCommission": maker, "takerCommission": taker})
            } else {
                json!({"symbol": symbol, "maker": maker, "taker": taker})
            };
            let manual: Vec<String> = if in_manual { vec![symbol.to_lowercase()] } else { vec![] };
            let heuristic: Vec<String> = if in_heuristic { vec![quote.clone()] } else { vec![] };
            let rules = FeeFreeRules::new(manual, heuristic);

            let flag = classify(&symbol, &quote, Some(&FeeEntry::from_value(&entry)), &rules);
            prop_assert_eq!(flag.method, FeeMethod::Api);
            prop_assert!(flag.fee_free);
        }

        /// Without fee data, a whitelisted quote beats the manual list.
        #[test]
        fn prop_heuristic_beats_manual(base in arb_asset(), quote in arb_asset()) {
            let symbol = format!("{}{}", base, quote);
            let rules = FeeFreeRules::new([symbol.clone()], [quote.to_lowercase()]);
            let flag = classify(&symbol, &quote, None, &rules);
            prop_assert_eq!(flag.method, FeeMethod::Heuristic);
        }

        /// Nothing matches: always STANDARD and not fee-free.
        #[test]
        fn prop_no_match_is_standard(base in arb_asset(), quote in arb_asset()) {
            let symbol = format!("{}{}", base, quote);
            let flag = classify(&symbol, &quote, None, &FeeFreeRules::default());
            prop_assert_eq!(flag, FeeFreeFlag::standard());
        }
    }
}
