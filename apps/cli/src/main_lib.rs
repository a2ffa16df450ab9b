use std::fmt::Display;
use std::sync::Arc;

use anyhow::{bail, Context};
use bbot_ai::{build_prompt, AiResponsePipeline};
use bbot_core::formatting::{format_price, format_spread, format_volume};
use bbot_core::{validate_risk, AppState, Config, StateMachine, StateSnapshot};
use bbot_market_data::{offline_pairs, PairCatalogService, PairFilters, PairInfo};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config_store::ConfigStore;

pub fn init_tracing(default_level: &str) {
    let log_format = std::env::var("BBOT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_ascii_lowercase()));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// Everything a command needs: the config snapshot and the shared state.
pub struct Shell {
    pub store: ConfigStore,
    pub config: Config,
    pub state: Arc<StateMachine>,
}

impl Shell {
    pub fn new(store: ConfigStore, config: Config, strict: bool) -> Self {
        let state = if strict {
            StateMachine::strict()
        } else {
            StateMachine::new()
        };
        state.subscribe(Box::new(|snapshot: &StateSnapshot| match &snapshot.last_error {
            Some(message) => tracing::warn!("Status: {} ({})", snapshot.state, message),
            None => tracing::info!("Status: {}", snapshot.state),
        }));
        let state = Arc::new(state);
        if let Err(e) = state.set_state(AppState::Configured, None) {
            tracing::warn!("{}", e);
        }
        Self {
            store,
            config,
            state,
        }
    }

    fn is_mock(&self) -> bool {
        self.config.app.mode == "mock"
    }

    fn catalog(&self) -> PairCatalogService {
        PairCatalogService::from_config(&self.config)
    }

    /// Put a failure on the shared status before handing it back.
    fn record<T, E: Display>(&self, result: Result<T, E>) -> Result<T, E> {
        if let Err(e) = &result {
            self.state.fail(e.to_string());
        }
        result
    }

    fn pipeline(&self) -> anyhow::Result<AiResponsePipeline> {
        let pipeline = self.record(AiResponsePipeline::from_config(
            &self.config,
            Arc::clone(&self.state),
        ))?;
        Ok(pipeline)
    }

    fn mark(&self, state: AppState) {
        if let Err(e) = self.state.set_state(state, None) {
            tracing::warn!("{}", e);
        }
    }

    pub async fn pairs(&self, quote: Option<&str>, all: bool) -> anyhow::Result<()> {
        let pairs = if self.is_mock() {
            offline_pairs()
                .into_iter()
                .filter(|p| quote.map_or(true, |q| p.quote() == q))
                .collect()
        } else {
            let mut catalog = self.catalog();
            let result = if all {
                catalog.list_pairs(quote).await
            } else {
                catalog.tradable_pairs(quote).await
            };
            self.record(result).context("Failed to load pairs")?
        };
        self.mark(AppState::PairsLoaded);

        println!("{:<14} {:<8} {:<8} {:<9} {}", "SYMBOL", "BASE", "QUOTE", "FEE-FREE", "METHOD");
        for pair in &pairs {
            print_pair(pair);
        }
        println!("{} pair(s)", pairs.len());
        Ok(())
    }

    pub async fn snapshot(&self, symbol: Option<&str>) -> anyhow::Result<()> {
        let symbol = symbol.unwrap_or(&self.config.app.active_pair).to_uppercase();
        if self.is_mock() {
            bail!("Market snapshots need live mode (app.mode = \"live\")");
        }
        let mut catalog = self.catalog();
        let filters = catalog.pair_filters(&symbol).await.ok().flatten();
        let snapshot = self
            .record(catalog.fetch_market_snapshot(&symbol).await)
            .context("Failed to fetch market snapshot")?;
        let tick = filters.as_ref().and_then(|f| f.tick_size);

        println!("{}", snapshot.symbol);
        println!("  Last:   {}", format_price(snapshot.last_price, tick));
        println!("  Bid:    {}", format_price(snapshot.bid, tick));
        println!("  Ask:    {}", format_price(snapshot.ask, tick));
        println!("  Spread: {}", format_spread(snapshot.spread));
        println!("  Vol24h: {}", format_volume(snapshot.volume_24h));
        if let Some(filters) = &filters {
            print_filters(filters);
        }
        Ok(())
    }

    pub async fn time_sync(&self) -> anyhow::Result<()> {
        let mut catalog = self.catalog();
        let status = self
            .record(catalog.time_sync_status().await)
            .context("Failed to check exchange time")?;
        println!(
            "Offset: {} ms ({})",
            status.offset_ms,
            if status.ok { "ok" } else { "drift" }
        );
        let report = catalog.connection_report();
        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    }

    pub async fn analyze(
        &mut self,
        message: &str,
        constraints: &[(String, String)],
        apply: bool,
    ) -> anyhow::Result<()> {
        let pipeline = self.pipeline()?;
        tracing::info!("{}", pipeline.describe());

        let (snapshot, filters) = if self.is_mock() {
            (None, None)
        } else {
            let mut catalog = self.catalog();
            let symbol = self.config.app.active_pair.clone();
            let snapshot = match catalog.fetch_market_snapshot(&symbol).await {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    tracing::warn!("Market snapshot unavailable: {}", e);
                    None
                }
            };
            let filters = catalog.pair_filters(&symbol).await.ok().flatten();
            (snapshot, filters)
        };

        let prompt = build_prompt(&self.config, snapshot.as_ref(), filters.as_ref(), constraints);
        let analysis = pipeline.run_chat(&prompt, message).await?;

        println!("{}", analysis.explanation);
        println!("{}", serde_json::to_string_pretty(&analysis.settings)?);

        if apply {
            let next = self.config.apply(&analysis.to_config_update());
            self.record(self.store.save(&next))?;
            self.config = next;
            println!("Settings applied to {}", self.store.path().display());
        }
        Ok(())
    }

    pub async fn health(&self) -> anyhow::Result<()> {
        let pipeline = self.pipeline()?;
        println!("AI: {}", pipeline.describe());
        println!(
            "AI reachable: {}",
            if pipeline.healthcheck().await { "yes" } else { "no" }
        );

        let risk = validate_risk(&self.config.risk);
        println!("Risk: {}", risk.summary());

        if !self.is_mock() {
            let mut catalog = self.catalog();
            match self.record(catalog.time_sync_status().await) {
                Ok(status) => println!("Exchange time offset: {} ms", status.offset_ms),
                Err(e) => println!("Exchange unreachable: {}", e),
            }
        }
        Ok(())
    }

    pub fn show_config(&self) -> anyhow::Result<()> {
        let mut masked = self.config.clone();
        masked.api_keys = masked.api_keys.masked();
        println!("{}", masked.to_json_pretty()?);
        Ok(())
    }
}

fn print_pair(pair: &PairInfo) {
    println!(
        "{:<14} {:<8} {:<8} {:<9} {}",
        pair.symbol(),
        pair.base(),
        pair.quote(),
        if pair.is_fee_free() { "yes" } else { "no" },
        pair.fee().method
    );
}

fn print_filters(filters: &PairFilters) {
    println!(
        "  Filters: tickSize={} stepSize={} minNotional={}",
        show(filters.tick_size),
        show(filters.step_size),
        show(filters.min_notional)
    );
}

fn show(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Parse `key=value` into a pair.
pub fn parse_constraint(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}
