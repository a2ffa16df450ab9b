use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::as_number;

/// How a pair's fee-free status was decided.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeMethod {
    /// The exchange reported zero maker and taker commission.
    Api,
    /// The quote asset is on the trusted whitelist.
    Heuristic,
    /// The operator listed the symbol manually.
    Manual,
    /// Regular fees apply.
    Standard,
}

impl FeeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "API",
            Self::Heuristic => "HEURISTIC",
            Self::Manual => "MANUAL",
            Self::Standard => "STANDARD",
        }
    }
}

impl fmt::Display for FeeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeFreeFlag {
    pub fee_free: bool,
    pub method: FeeMethod,
    pub notes: Option<String>,
}

impl FeeFreeFlag {
    pub fn new(fee_free: bool, method: FeeMethod, notes: Option<&str>) -> Self {
        Self {
            fee_free,
            method,
            notes: notes.map(str::to_string),
        }
    }

    pub fn standard() -> Self {
        Self::new(false, FeeMethod::Standard, None)
    }
}

/// One row of the exchange trade-fee endpoint.
///
/// The endpoint has shipped both `makerCommission`/`takerCommission` and the
/// short `maker`/`taker` names; the long name wins when both are present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeeEntry {
    pub symbol: String,
    pub maker: Option<Value>,
    pub taker: Option<Value>,
}

impl FeeEntry {
    pub fn from_value(value: &Value) -> Self {
        let pick = |long: &str, short: &str| {
            value
                .get(long)
                .or_else(|| value.get(short))
                .filter(|v| !v.is_null())
                .cloned()
        };
        Self {
            symbol: value
                .get("symbol")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            maker: pick("makerCommission", "maker"),
            taker: pick("takerCommission", "taker"),
        }
    }

    /// Both commissions are exactly zero.
    ///
    /// An absent commission counts as zero; one that is present but not a
    /// number does not.
    pub fn is_zero_fee(&self) -> bool {
        fn is_zero(commission: &Option<Value>) -> bool {
            match commission {
                None => true,
                Some(v) => as_number(v) == Some(0.0),
            }
        }
        is_zero(&self.maker) && is_zero(&self.taker)
    }
}
