mod config_store;
mod main_lib;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use config_store::{apply_env_overrides, ConfigStore};
use main_lib::{init_tracing, parse_constraint, Shell};

#[derive(Parser)]
#[command(name = "bbot")]
#[command(about = "BBOT trading copilot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the JSON config file
    #[arg(short, long, env = "BBOT_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Reject state transitions outside the documented table
    #[arg(long)]
    strict_state: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List pairs with their fee-free classification
    Pairs {
        /// Only pairs quoted in this asset (exact match, e.g. USDT)
        #[arg(short, long)]
        quote: Option<String>,

        /// Include pairs that are not trading
        #[arg(long)]
        all: bool,
    },

    /// Show last price, book and 24h volume
    Snapshot {
        /// Trading symbol (defaults to the active pair)
        #[arg(short, long)]
        symbol: Option<String>,
    },

    /// Check clock drift against the exchange
    TimeSync,

    /// Ask the AI for trading settings
    Analyze {
        /// Message passed to the model
        #[arg(short, long, default_value = "Suggest settings for the active pair")]
        message: String,

        /// Extra constraint as key=value (repeatable)
        #[arg(long = "constraint", value_parser = parse_constraint)]
        constraints: Vec<(String, String)>,

        /// Save the suggested settings to the config file
        #[arg(long)]
        apply: bool,
    },

    /// Report AI and exchange reachability and the risk profile
    Health,

    /// Print the config with secrets masked
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let store = ConfigStore::new(&cli.config);
    let config = apply_env_overrides(store.load()?, |name| std::env::var(name).ok());
    init_tracing(&config.app.log_level);
    tracing::info!(
        "Loaded config from {} (mode: {})",
        store.path().display(),
        config.app.mode
    );

    let mut shell = Shell::new(store, config, cli.strict_state);
    match cli.command {
        Commands::Pairs { quote, all } => shell.pairs(quote.as_deref(), all).await,
        Commands::Snapshot { symbol } => shell.snapshot(symbol.as_deref()).await,
        Commands::TimeSync => shell.time_sync().await,
        Commands::Analyze {
            message,
            constraints,
            apply,
        } => shell.analyze(&message, &constraints, apply).await,
        Commands::Health => shell.health().await,
        Commands::Config => shell.show_config(),
    }
}
