//! Pair catalog: cached exchange metadata, classified pairs and snapshots.

mod cache;
mod offline;

pub use cache::ExchangeInfoCache;
pub use offline::offline_pairs;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bbot_core::Config;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::classifier::{classify, FeeFreeRules};
use crate::client::{HttpClientConfig, RateLimitedHttpClient};
use crate::errors::ExchangeError;
use crate::models::{ExchangeInfoPayload, FeeEntry, MarketSnapshot, PairFilters, PairInfo};

/// Clock drift below this is considered in sync.
pub const MAX_TIME_OFFSET_MS: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSyncStatus {
    pub offset_ms: i64,
    pub ok: bool,
}

impl TimeSyncStatus {
    pub fn from_offset(offset_ms: i64) -> Self {
        Self {
            offset_ms,
            ok: offset_ms.abs() < MAX_TIME_OFFSET_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionReport {
    pub rest_ok: bool,
    pub time_offset_ms: Option<i64>,
    /// Seconds since exchange info was last fetched.
    pub cache_age: Option<f64>,
}

pub struct PairCatalogService {
    client: RateLimitedHttpClient,
    cache: ExchangeInfoCache,
    rules: FeeFreeRules,
    last_time_offset_ms: Option<i64>,
    rest_ok: bool,
}

impl PairCatalogService {
    pub fn new(client: RateLimitedHttpClient, cache_ttl: Duration, rules: FeeFreeRules) -> Self {
        Self {
            client,
            cache: ExchangeInfoCache::new(cache_ttl),
            rules,
            last_time_offset_ms: None,
            rest_ok: true,
        }
    }

    /// Catalog backed by a `reqwest` client built from the config snapshot.
    pub fn from_config(config: &Config) -> Self {
        let client = RateLimitedHttpClient::new(HttpClientConfig::from_config(config));
        Self::new(
            client,
            Duration::from_secs(config.exchange.cache_ttl_seconds),
            FeeFreeRules::from_settings(&config.pairs),
        )
    }

    pub fn client(&self) -> &RateLimitedHttpClient {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut RateLimitedHttpClient {
        &mut self.client
    }

    pub fn rules(&self) -> &FeeFreeRules {
        &self.rules
    }

    /// Exchange info, from cache while fresh unless `force` is set.
    pub async fn refresh_exchange_info(
        &mut self,
        force: bool,
    ) -> Result<Arc<ExchangeInfoPayload>, ExchangeError> {
        if !force {
            if let Some(payload) = self.cache.get() {
                return Ok(payload);
            }
        }
        debug!("Exchange info cache miss (force: {})", force);

        let result = match self.client.fetch_exchange_info().await {
            Ok(raw) => ExchangeInfoPayload::from_raw(raw),
            Err(e) => Err(e),
        };
        match result {
            Ok(payload) => {
                self.rest_ok = true;
                let payload = self.cache.store(payload);
                info!("Loaded exchange info: {} symbols", payload.symbols().len());
                Ok(payload)
            }
            Err(e) => {
                self.rest_ok = false;
                Err(e)
            }
        }
    }

    /// All symbols, or those whose quote asset equals `quote_filter` exactly.
    pub async fn list_pairs(
        &mut self,
        quote_filter: Option<&str>,
    ) -> Result<Vec<PairInfo>, ExchangeError> {
        let payload = self.refresh_exchange_info(false).await?;
        let fees = self.fee_map().await;

        let pairs = payload
            .symbols()
            .iter()
            .filter(|s| quote_filter.map_or(true, |quote| s.quote_asset == quote))
            .map(|s| {
                let fee = classify(
                    &s.symbol,
                    &s.quote_asset,
                    fees.get(&s.symbol.to_uppercase()),
                    &self.rules,
                );
                PairInfo::from_symbol(s, fee)
            })
            .collect();
        Ok(pairs)
    }

    /// Trading-status pairs sorted by symbol.
    pub async fn tradable_pairs(
        &mut self,
        quote_filter: Option<&str>,
    ) -> Result<Vec<PairInfo>, ExchangeError> {
        let mut pairs: Vec<PairInfo> = self
            .list_pairs(quote_filter)
            .await?
            .into_iter()
            .filter(PairInfo::is_trading)
            .collect();
        if pairs.is_empty() {
            return Err(ExchangeError::NoPairsReturned);
        }
        pairs.sort_by(|a, b| a.symbol().cmp(b.symbol()));
        Ok(pairs)
    }

    /// Filters of one symbol from the cached exchange info.
    pub async fn pair_filters(&mut self, symbol: &str) -> Result<Option<PairFilters>, ExchangeError> {
        let payload = self.refresh_exchange_info(false).await?;
        Ok(payload
            .symbols()
            .iter()
            .find(|s| s.symbol.eq_ignore_ascii_case(symbol))
            .map(|s| PairFilters::from_filters(&s.filters)))
    }

    /// Fresh 24h stats and book ticker for `symbol`. Never cached.
    pub async fn fetch_market_snapshot(
        &mut self,
        symbol: &str,
    ) -> Result<MarketSnapshot, ExchangeError> {
        let stats = self.client.fetch_ticker_24h(Some(symbol)).await?;
        let book = self.client.fetch_book_ticker(symbol).await?;
        Ok(MarketSnapshot::from_payload(symbol, &book, &stats))
    }

    pub async fn time_sync_status(&mut self) -> Result<TimeSyncStatus, ExchangeError> {
        let offset = self.client.measure_time_offset().await?;
        self.last_time_offset_ms = Some(offset);
        let status = TimeSyncStatus::from_offset(offset);
        if !status.ok {
            warn!("Clock drift against exchange is {} ms", offset);
        }
        Ok(status)
    }

    pub fn connection_report(&self) -> ConnectionReport {
        ConnectionReport {
            rest_ok: self.rest_ok,
            time_offset_ms: self.last_time_offset_ms,
            cache_age: self.cache.age().map(|age| age.as_secs_f64()),
        }
    }

    /// Trade fees keyed by upper-cased symbol. Empty when unavailable.
    ///
    /// The fee endpoint needs an API key; without one it is not called.
    async fn fee_map(&mut self) -> HashMap<String, FeeEntry> {
        if self.client.config().api_key.is_none() {
            debug!("No exchange API key configured, skipping fee lookup");
            return HashMap::new();
        }
        match self.client.fetch_trade_fees().await {
            Ok(entries) => entries
                .into_iter()
                .map(|entry| (entry.symbol.to_uppercase(), entry))
                .collect(),
            Err(e) => {
                warn!("Fee data unavailable from exchange: {}", e);
                HashMap::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{test_config, ScriptedTransport};
    use crate::client::{
        HttpResponse, BOOK_TICKER_PATH, EXCHANGE_INFO_PATH, SERVER_TIME_PATH, TICKER_24H_PATH,
        TRADE_FEE_PATH,
    };
    use crate::models::FeeMethod;
    use serde_json::{json, Value};

    fn symbol(symbol: &str, base: &str, quote: &str, status: &str) -> Value {
        json!({
            "symbol": symbol,
            "baseAsset": base,
            "quoteAsset": quote,
            "status": status,
            "filters": [
                {"filterType": "PRICE_FILTER", "tickSize": "0.01"},
                {"filterType": "LOT_SIZE", "stepSize": "0.0001"},
                {"filterType": "NOTIONAL", "minNotional": "5"}
            ]
        })
    }

    fn exchange_info() -> Value {
        json!({"symbols": [
            symbol("ETHUSDT", "ETH", "USDT", "TRADING"),
            symbol("BTCUSDT", "BTC", "USDT", "TRADING"),
            symbol("BTCFDUSD", "BTC", "FDUSD", "TRADING"),
            symbol("BTCusdt", "BTC", "usdt", "TRADING"),
            symbol("LUNAUSDT", "LUNA", "USDT", "BREAK")
        ]})
    }

    fn catalog(transport: Arc<ScriptedTransport>, max_retries: u32) -> PairCatalogService {
        let config = HttpClientConfig {
            api_key: Some("test-key".to_string()),
            ..test_config(max_retries)
        };
        let client = RateLimitedHttpClient::with_transport(config, transport);
        PairCatalogService::new(
            client,
            Duration::from_secs(900),
            FeeFreeRules::new(["ethusdt"], ["FDUSD"]),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_refresh_issues_one_request() {
        let transport = ScriptedTransport::new();
        transport.push_json(EXCHANGE_INFO_PATH, exchange_info());
        let mut catalog = catalog(transport.clone(), 0);

        let first = catalog.refresh_exchange_info(false).await.unwrap();
        let second = catalog.refresh_exchange_info(false).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.raw, second.raw);
        assert_eq!(transport.count(EXCHANGE_INFO_PATH), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_expires_after_ttl() {
        let transport = ScriptedTransport::new();
        transport.push_json(EXCHANGE_INFO_PATH, exchange_info());
        let mut catalog = catalog(transport.clone(), 0);

        catalog.refresh_exchange_info(false).await.unwrap();
        tokio::time::advance(Duration::from_secs(899)).await;
        catalog.refresh_exchange_info(false).await.unwrap();
        assert_eq!(transport.count(EXCHANGE_INFO_PATH), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        catalog.refresh_exchange_info(false).await.unwrap();
        assert_eq!(transport.count(EXCHANGE_INFO_PATH), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_refetches_and_resets_age() {
        let transport = ScriptedTransport::new();
        transport.push_json(EXCHANGE_INFO_PATH, exchange_info());
        let mut catalog = catalog(transport.clone(), 0);

        let first = catalog.refresh_exchange_info(false).await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        let forced = catalog.refresh_exchange_info(true).await.unwrap();

        assert!(!Arc::ptr_eq(&first, &forced));
        assert_eq!(transport.count(EXCHANGE_INFO_PATH), 2);
        assert_eq!(catalog.connection_report().cache_age, Some(0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_quote_filter_is_exact() {
        let transport = ScriptedTransport::new();
        transport.push_json(EXCHANGE_INFO_PATH, exchange_info());
        transport.push_json(TRADE_FEE_PATH, json!([]));
        let mut catalog = catalog(transport, 0);

        let pairs = catalog.list_pairs(Some("USDT")).await.unwrap();
        let symbols: Vec<&str> = pairs.iter().map(PairInfo::symbol).collect();
        assert_eq!(symbols, vec!["ETHUSDT", "BTCUSDT", "LUNAUSDT"]);

        let all = catalog.list_pairs(None).await.unwrap();
        assert_eq!(all.len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pairs_are_classified() {
        let transport = ScriptedTransport::new();
        transport.push_json(EXCHANGE_INFO_PATH, exchange_info());
        transport.push_json(
            TRADE_FEE_PATH,
            json!([
                {"symbol": "btcusdt", "makerCommission": "0", "takerCommission": "0"},
                {"symbol": "ETHUSDT", "makerCommission": "0.001", "takerCommission": "0.001"}
            ]),
        );
        let mut catalog = catalog(transport, 0);

        let pairs = catalog.list_pairs(None).await.unwrap();
        let method = |symbol: &str| {
            pairs
                .iter()
                .find(|p| p.symbol() == symbol)
                .map(|p| p.fee().method)
                .unwrap()
        };
        assert_eq!(method("BTCUSDT"), FeeMethod::Api);
        assert_eq!(method("BTCFDUSD"), FeeMethod::Heuristic);
        assert_eq!(method("ETHUSDT"), FeeMethod::Manual);
        assert_eq!(method("LUNAUSDT"), FeeMethod::Standard);

        let btc = pairs.iter().find(|p| p.symbol() == "BTCUSDT").unwrap();
        assert_eq!(btc.filters().min_notional, Some(5.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fee_failure_degrades_to_heuristic() {
        let transport = ScriptedTransport::new();
        transport.push_json(EXCHANGE_INFO_PATH, exchange_info());
        transport.push(TRADE_FEE_PATH, Ok(HttpResponse::new(401, "unauthorized")));
        let mut catalog = catalog(transport, 1);

        let pairs = catalog.list_pairs(None).await.unwrap();

        let fdusd = pairs.iter().find(|p| p.symbol() == "BTCFDUSD").unwrap();
        assert_eq!(fdusd.fee().method, FeeMethod::Heuristic);
        assert!(pairs.iter().all(|p| p.fee().method != FeeMethod::Api));
        assert!(catalog.connection_report().rest_ok);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fee_lookup_skipped_without_api_key() {
        let transport = ScriptedTransport::new();
        transport.push_json(EXCHANGE_INFO_PATH, exchange_info());
        transport.push(TRADE_FEE_PATH, Ok(HttpResponse::new(401, "unauthorized")));
        let client = RateLimitedHttpClient::with_transport(test_config(3), transport.clone());
        let mut catalog = PairCatalogService::new(
            client,
            Duration::from_secs(900),
            FeeFreeRules::new(["ethusdt"], ["FDUSD"]),
        );

        let start = tokio::time::Instant::now();
        let pairs = catalog.list_pairs(None).await.unwrap();

        assert_eq!(transport.count(TRADE_FEE_PATH), 0);
        assert_eq!(start.elapsed(), Duration::ZERO);
        let fdusd = pairs.iter().find(|p| p.symbol() == "BTCFDUSD").unwrap();
        assert_eq!(fdusd.fee().method, FeeMethod::Heuristic);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tradable_pairs_sorted_and_trading_only() {
        let transport = ScriptedTransport::new();
        transport.push_json(EXCHANGE_INFO_PATH, exchange_info());
        transport.push_json(TRADE_FEE_PATH, json!([]));
        let mut catalog = catalog(transport, 0);

        let pairs = catalog.tradable_pairs(Some("USDT")).await.unwrap();
        let symbols: Vec<&str> = pairs.iter().map(PairInfo::symbol).collect();
        assert_eq!(symbols, vec!["BTCUSDT", "ETHUSDT"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_tradable_pairs_is_an_error() {
        let transport = ScriptedTransport::new();
        transport.push_json(EXCHANGE_INFO_PATH, exchange_info());
        transport.push_json(TRADE_FEE_PATH, json!([]));
        let mut catalog = catalog(transport, 0);

        let err = catalog.tradable_pairs(Some("EUR")).await.unwrap_err();
        assert_eq!(err, ExchangeError::NoPairsReturned);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_marks_rest_down() {
        let transport = ScriptedTransport::new();
        transport.push(EXCHANGE_INFO_PATH, Ok(HttpResponse::new(502, "bad gateway")));
        transport.push_json(EXCHANGE_INFO_PATH, exchange_info());
        let mut catalog = catalog(transport, 0);

        assert!(catalog.refresh_exchange_info(false).await.is_err());
        let report = catalog.connection_report();
        assert!(!report.rest_ok);
        assert_eq!(report.cache_age, None);

        catalog.refresh_exchange_info(false).await.unwrap();
        assert!(catalog.connection_report().rest_ok);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pair_filters_lookup() {
        let transport = ScriptedTransport::new();
        transport.push_json(EXCHANGE_INFO_PATH, exchange_info());
        let mut catalog = catalog(transport, 0);

        let filters = catalog.pair_filters("ethusdt").await.unwrap().unwrap();
        assert_eq!(filters.tick_size, Some(0.01));
        assert_eq!(filters.step_size, Some(0.0001));
        assert!(catalog.pair_filters("DOGEUSDT").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_market_snapshot() {
        let transport = ScriptedTransport::new();
        transport.push_json(
            TICKER_24H_PATH,
            json!({"symbol": "BTCUSDT", "lastPrice": "100.5", "volume": "1234.5", "closeTime": 1_700_000_000_000i64}),
        );
        transport.push_json(
            BOOK_TICKER_PATH,
            json!({"symbol": "BTCUSDT", "bidPrice": "100.0", "askPrice": "101.0"}),
        );
        let mut catalog = catalog(transport, 0);

        let snapshot = catalog.fetch_market_snapshot("BTCUSDT").await.unwrap();
        assert_eq!(snapshot.spread, Some(1.0));
        assert_eq!(snapshot.last_price, Some(100.5));
        assert_eq!(snapshot.timestamp, Some(1_700_000_000_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_sync_status() {
        let transport = ScriptedTransport::new();
        let now = chrono::Utc::now().timestamp_millis();
        transport.push_json(SERVER_TIME_PATH, json!({"serverTime": now + 60_000}));
        let mut catalog = catalog(transport, 0);

        let status = catalog.time_sync_status().await.unwrap();
        assert!(!status.ok);
        assert!(status.offset_ms > 50_000);
        assert_eq!(
            catalog.connection_report().time_offset_ms,
            Some(status.offset_ms)
        );
    }

    #[test]
    fn test_time_sync_threshold() {
        assert!(TimeSyncStatus::from_offset(999).ok);
        assert!(TimeSyncStatus::from_offset(-999).ok);
        assert!(!TimeSyncStatus::from_offset(1000).ok);
        assert!(!TimeSyncStatus::from_offset(-1500).ok);
    }
}
