//! CLI argument definitions.

use clap::{Parser, Subcommand, ValueEnum};

use crate::commands::{AssetRiskArgs, CalibrateArgs, SimulateArgs, SnapshotArgs};

/// Lendvar - Monte Carlo bad-debt VaR for lending protocols
#[derive(Parser)]
#[command(name = "lendvar")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Log progress at debug level to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Simulate protocol bad debt and report its VaR
    Simulate(SimulateArgs),

    /// Report bad debt at current prices
    Snapshot(SnapshotArgs),

    /// Simulate per-asset price tails over several terms
    AssetRisk(AssetRiskArgs),

    /// Estimate market parameters from daily price history
    Calibrate(CalibrateArgs),
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Path scheme options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemeArg {
    /// Step through daily increments
    Discretized,
    /// Draw the terminal price directly
    ClosedForm,
}

impl From<SchemeArg> for lendvar_risk::PathScheme {
    fn from(arg: SchemeArg) -> Self {
        match arg {
            SchemeArg::Discretized => Self::Discretized,
            SchemeArg::ClosedForm => Self::ClosedForm,
        }
    }
}
