//! Simulate command implementation.
//!
//! Runs the Monte Carlo bad-debt simulation and reports its VaR.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use lendvar_core::Diagnostics;
use lendvar_portfolio::Portfolio;
use lendvar_risk::{
    BadDebtSimulator, Histogram, MarketModel, PathScheme, SimulationConfig, TailRiskSummary,
};

use crate::cli::{OutputFormat, SchemeArg};
use crate::commands::{validate_percentile, validate_scenarios};
use crate::io::{read_config, read_market, read_positions};
use crate::output::{format_usd, print_diagnostics, print_header, print_json, print_table, KeyValue};

/// Arguments for the simulate command.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Positions CSV (user_id,symbol,collateral_amount,debt_amount,is_collateral,price)
    #[arg(short, long)]
    pub positions: PathBuf,

    /// Market parameters JSON
    #[arg(short, long)]
    pub market: PathBuf,

    /// Simulation config TOML; flags below override its fields
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of scenarios
    #[arg(long)]
    pub scenarios: Option<usize>,

    /// Random seed
    #[arg(long, env = "LENDVAR_SEED")]
    pub seed: Option<u64>,

    /// VaR confidence in percent (e.g. 99.9)
    #[arg(long)]
    pub percentile: Option<f64>,

    /// Horizon in years
    #[arg(long)]
    pub horizon: Option<f64>,

    /// Time steps over the horizon
    #[arg(long)]
    pub steps: Option<usize>,

    /// Terminal price sampling scheme
    #[arg(long, value_enum)]
    pub scheme: Option<SchemeArg>,

    /// Print a histogram of the shortfall distribution with this many bins
    #[arg(long, default_value = "0")]
    pub histogram_bins: usize,

    /// Include every scenario's shortfall in JSON output
    #[arg(long)]
    pub distribution: bool,
}

impl SimulateArgs {
    /// Loads the config file, if any, and applies flag overrides.
    fn simulation_config(&self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => SimulationConfig::default(),
        };
        if let Some(scenarios) = self.scenarios {
            config.scenarios = validate_scenarios(scenarios)?;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(percentile) = self.percentile {
            config.var_percentile = validate_percentile(percentile)?;
        }
        if let Some(horizon) = self.horizon {
            config.horizon_years = horizon;
        }
        if let Some(steps) = self.steps {
            config.steps = steps;
        }
        if let Some(scheme) = self.scheme {
            config.scheme = scheme.into();
        }
        Ok(config)
    }
}

#[derive(Serialize)]
struct SimulationOutput<'a> {
    seed: u64,
    scheme: PathScheme,
    horizon_years: f64,
    accounts: usize,
    summary: TailRiskSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    histogram: Option<Histogram>,
    #[serde(skip_serializing_if = "Option::is_none")]
    distribution: Option<&'a [f64]>,
    diagnostics: &'a Diagnostics,
}

#[derive(Tabled)]
struct HistogramRow {
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "To")]
    to: String,
    #[tabled(rename = "Scenarios")]
    count: usize,
}

/// Execute the simulate command.
pub fn execute(args: SimulateArgs, format: OutputFormat) -> Result<()> {
    let config = args.simulation_config()?;

    let portfolio = Portfolio::from_records(read_positions(&args.positions)?)?;
    let market = MarketModel::from_parameters(&read_market(&args.market)?)?;

    let report = BadDebtSimulator::new(&market, &portfolio, config).run()?;
    let histogram = match args.histogram_bins {
        0 => None,
        bins => Some(report.histogram(bins)?),
    };

    match format {
        OutputFormat::Json => {
            let output = SimulationOutput {
                seed: report.seed,
                scheme: report.scheme,
                horizon_years: report.horizon_years,
                accounts: report.accounts,
                summary: report.summary,
                histogram,
                distribution: args.distribution.then(|| report.distribution.values()),
                diagnostics: &report.diagnostics,
            };
            print_json(&output)?;
        }
        OutputFormat::Table => {
            let summary = &report.summary;
            let results = vec![
                KeyValue::new("Scenarios", summary.scenarios.to_string()),
                KeyValue::new("Accounts", report.accounts.to_string()),
                KeyValue::new("Horizon", format!("{} years", report.horizon_years)),
                KeyValue::new("Scheme", report.scheme.to_string()),
                KeyValue::new("Seed", report.seed.to_string()),
                KeyValue::from_usd(format!("VaR ({}%)", summary.confidence_pct), summary.var),
                KeyValue::from_usd("Average Bad Debt", summary.mean),
                KeyValue::from_usd("Max Bad Debt", summary.max),
                KeyValue::new("Diagnostics", report.diagnostics.len().to_string()),
            ];

            print_header("Bad-Debt VaR");
            print_table(&results);

            if let Some(histogram) = histogram {
                let rows: Vec<HistogramRow> = histogram
                    .edges
                    .windows(2)
                    .zip(&histogram.counts)
                    .map(|(edge, count)| HistogramRow {
                        from: format_usd(edge[0]),
                        to: format_usd(edge[1]),
                        count: *count,
                    })
                    .collect();
                print_header("Shortfall Distribution");
                print_table(&rows);
            }

            print_diagnostics(&report.diagnostics);
        }
    }

    Ok(())
}
