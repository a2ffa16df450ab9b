use crate::models::{FeeFreeFlag, FeeMethod, PairInfo, TRADING_STATUS};

const OFFLINE_BASES: [&str; 4] = ["BTC", "ETH", "BNB", "SOL"];
const OFFLINE_QUOTE: &str = "USDT";

/// Canned pair list for mock mode, when the exchange is not consulted.
pub fn offline_pairs() -> Vec<PairInfo> {
    OFFLINE_BASES
        .iter()
        .map(|base| {
            let symbol = format!("{}{}", base, OFFLINE_QUOTE);
            PairInfo::from_parts(
                &symbol,
                base,
                OFFLINE_QUOTE,
                TRADING_STATUS,
                FeeFreeFlag::new(true, FeeMethod::Heuristic, Some("Offline list")),
            )
        })
        .collect()
}
