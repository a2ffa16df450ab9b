//! BBOT Market Data Crate
//!
//! Read-only access to the exchange REST API for the trading copilot.
//!
//! # Overview
//!
//! The crate supports:
//! - Rate-limited GET requests with bounded retries and cooldown handling
//! - Cached exchange metadata (symbols, filters)
//! - Fee-free pair detection from exchange fee data and whitelists
//! - Fresh market snapshots and clock-drift checks
//!
//! # Architecture
//!
//! ```text
//! +--------------------+
//! | PairCatalogService |  (cache, pair listing, snapshots)
//! +--------------------+
//!           |                    +------------------+
//!           +------------------> |    classify()    |  (API > HEURISTIC > MANUAL > STANDARD)
//!           v                    +------------------+
//! +-----------------------+
//! | RateLimitedHttpClient |  (cooldown, backoff, retry budget)
//! +-----------------------+
//!           |
//!           v
//! +--------------------+
//! |   HttpTransport    |  (reqwest, or scripted in tests)
//! +--------------------+
//! ```
//!
//! # Core Types
//!
//! - [`PairInfo`] - Classified trading pair
//! - [`PairFilters`] - Tick size, step size and minimum notional
//! - [`FeeFreeFlag`] - Fee-free decision and the rule that made it
//! - [`MarketSnapshot`] - Last price, book and 24h volume for one symbol

pub mod catalog;
pub mod classifier;
pub mod client;
pub mod errors;
pub mod models;

pub use catalog::{
    offline_pairs, ConnectionReport, ExchangeInfoCache, PairCatalogService, TimeSyncStatus,
};
pub use classifier::{classify, FeeFreeRules};
pub use client::{
    estimate_time_offset, HttpClientConfig, HttpRequest, HttpResponse, HttpTransport,
    RateLimitedHttpClient, ReqwestTransport,
};
pub use errors::{ExchangeError, RetryClass};
pub use models::{
    ExchangeInfo, ExchangeInfoPayload, FeeEntry, FeeFreeFlag, FeeMethod, MarketSnapshot,
    PairFilters, PairInfo, SymbolInfo,
};
