use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::number_field;

const PRICE_FILTER: &str = "PRICE_FILTER";
const LOT_SIZE: &str = "LOT_SIZE";
const MIN_NOTIONAL: &str = "MIN_NOTIONAL";
const NOTIONAL: &str = "NOTIONAL";

/// Trading rules reported by the exchange for one pair.
///
/// A field is `None` when the exchange did not report the corresponding
/// filter. Zero is a legitimate value and is kept as such.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairFilters {
    pub tick_size: Option<f64>,
    pub step_size: Option<f64>,
    pub min_notional: Option<f64>,
    pub raw_filters: Vec<Value>,
}

impl PairFilters {
    pub fn from_filters(filters: &[Value]) -> Self {
        let mut tick_size = None;
        let mut step_size = None;
        let mut min_notional = None;
        let mut notional = None;

        for filter in filters {
            match filter.get("filterType").and_then(Value::as_str) {
                Some(PRICE_FILTER) => tick_size = number_field(filter, "tickSize"),
                Some(LOT_SIZE) => step_size = number_field(filter, "stepSize"),
                Some(MIN_NOTIONAL) => min_notional = number_field(filter, "minNotional"),
                // Newer symbols report NOTIONAL instead of MIN_NOTIONAL.
                Some(NOTIONAL) => notional = number_field(filter, "minNotional"),
                _ => {}
            }
        }

        Self {
            tick_size,
            step_size,
            min_notional: min_notional.or(notional),
            raw_filters: filters.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reads_all_three_filters() {
        let raw = vec![
            json!({"filterType": "PRICE_FILTER", "tickSize": "0.01"}),
            json!({"filterType": "LOT_SIZE", "stepSize": "0.001"}),
            json!({"filterType": "MIN_NOTIONAL", "minNotional": "10"}),
        ];
        let filters = PairFilters::from_filters(&raw);
        assert_eq!(filters.tick_size, Some(0.01));
        assert_eq!(filters.step_size, Some(0.001));
        assert_eq!(filters.min_notional, Some(10.0));
        assert_eq!(filters.raw_filters, raw);
    }

    #[test]
    fn test_missing_filter_types_stay_none() {
        let raw = vec![json!({"filterType": "PRICE_FILTER", "tickSize": "0.1"})];
        let filters = PairFilters::from_filters(&raw);
        assert_eq!(filters.tick_size, Some(0.1));
        assert_eq!(filters.step_size, None);
        assert_eq!(filters.min_notional, None);
    }

    #[test]
    fn test_zero_tick_is_kept() {
        let raw = vec![json!({"filterType": "PRICE_FILTER", "tickSize": "0.00000000"})];
        let filters = PairFilters::from_filters(&raw);
        assert_eq!(filters.tick_size, Some(0.0));
    }

    #[test]
    fn test_notional_filter_is_fallback_for_min_notional() {
        let raw = vec![json!({"filterType": "NOTIONAL", "minNotional": "5.00000000"})];
        assert_eq!(PairFilters::from_filters(&raw).min_notional, Some(5.0));

        let raw = vec![
            json!({"filterType": "NOTIONAL", "minNotional": "5"}),
            json!({"filterType": "MIN_NOTIONAL", "minNotional": "10"}),
        ];
        assert_eq!(PairFilters::from_filters(&raw).min_notional, Some(10.0));
    }

    #[test]
    fn test_empty_list() {
        let filters = PairFilters::from_filters(&[]);
        assert_eq!(filters, PairFilters::default());
    }
}
