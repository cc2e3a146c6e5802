//! Lendvar CLI - Monte Carlo bad-debt VaR for lending protocols.
//!
//! # Usage
//!
//! ```bash
//! # Estimate market parameters from daily prices
//! lendvar calibrate --prices data/prices.csv > data/market.json
//!
//! # Bad debt at current prices
//! lendvar snapshot --positions data/active_positions.csv --market data/market.json
//!
//! # 99.9% one-year VaR of protocol bad debt
//! lendvar simulate --positions data/active_positions.csv --market data/market.json --seed 42
//!
//! # Per-asset price tails over 30, 90 and 365 days
//! lendvar asset-risk --market data/market.json
//! ```

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod commands;
mod error;
mod io;
mod output;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON on stdout stays parseable
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("lendvar_cli=debug,lendvar_risk=debug,lendvar_portfolio=debug")
        })
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let format = cli.format;

    match cli.command {
        Commands::Simulate(args) => commands::simulate::execute(args, format)?,
        Commands::Snapshot(args) => commands::snapshot::execute(args, format)?,
        Commands::AssetRisk(args) => commands::asset_risk::execute(args, format)?,
        Commands::Calibrate(args) => commands::calibrate::execute(args, format)?,
    }

    Ok(())
}
