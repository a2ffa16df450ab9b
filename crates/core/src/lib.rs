//! BBOT Core - shared state, configuration and retry primitives.
//!
//! This crate has no I/O of its own. The exchange and AI crates depend on it
//! for the [`StateMachine`] they report through, the [`Config`] snapshot they
//! read, and the [`RetryPolicy`] combinator.

pub mod config;
pub mod errors;
pub mod formatting;
pub mod retry;
pub mod risk;
pub mod state;

pub use config::{
    mask_secret, DEFAULT_BASE_URL, TESTNET_BASE_URL, AiConfig, ApiKeys, AppSettings, Config, ConfigUpdate, ExchangeSettings,
    PairSettings, RiskSettings, TradingSettings, TradingSettingsUpdate,
};
pub use retry::{RetryDecision, RetryOutcome, RetryPolicy};
pub use risk::{validate_risk, RiskReport, RiskStatus};
pub use state::{AppState, StateMachine, StateSnapshot, TransitionListener};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
