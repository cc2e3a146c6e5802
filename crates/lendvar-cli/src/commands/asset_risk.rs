//! Asset-risk command implementation.
//!
//! Simulates each asset alone and reports its price tail per term.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tabled::Tabled;

use lendvar_risk::{asset_term_risk, AssetRiskConfig, MarketModel};

use crate::cli::OutputFormat;
use crate::commands::{terms_from_days, validate_percentile, validate_scenarios};
use crate::io::read_market;
use crate::output::{format_percent, print_header, print_json, print_table};

/// Arguments for the asset-risk command.
#[derive(Args, Debug)]
pub struct AssetRiskArgs {
    /// Market parameters JSON
    #[arg(short, long)]
    pub market: PathBuf,

    /// Confidence in percent (e.g. 99.9)
    #[arg(long, default_value = "99.9")]
    pub percentile: f64,

    /// Scenarios per asset and term
    #[arg(long, default_value = "10000")]
    pub scenarios: usize,

    /// Random seed
    #[arg(long, env = "LENDVAR_SEED")]
    pub seed: Option<u64>,

    /// Term lengths in days, comma separated; a term uses the market's
    /// window volatility of the same length when present
    #[arg(long, value_delimiter = ',', default_values_t = [30, 90, 365])]
    pub days: Vec<u32>,
}

#[derive(Tabled)]
struct TermRow {
    #[tabled(rename = "Asset")]
    symbol: String,
    #[tabled(rename = "Term")]
    term: String,
    #[tabled(rename = "Spot")]
    spot: String,
    #[tabled(rename = "Volatility")]
    volatility: String,
    #[tabled(rename = "VaR Price")]
    var_price: String,
    #[tabled(rename = "Drawdown")]
    drawdown: String,
    #[tabled(rename = "1d Parametric VaR")]
    parametric: String,
}

/// Execute the asset-risk command.
pub fn execute(args: AssetRiskArgs, format: OutputFormat) -> Result<()> {
    let mut config = AssetRiskConfig::new()
        .with_scenarios(validate_scenarios(args.scenarios)?)
        .with_var_percentile(validate_percentile(args.percentile)?)
        .with_terms(terms_from_days(&args.days)?);
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let market = MarketModel::from_parameters(&read_market(&args.market)?)?;
    let report = asset_term_risk(&market, &config)?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            let rows: Vec<TermRow> = report
                .assets
                .iter()
                .flat_map(|asset| {
                    asset.terms.iter().map(move |term| TermRow {
                        symbol: asset.symbol.to_string(),
                        term: format!("{} ({}d)", term.term.label, term.term.days),
                        spot: format!("{:.4}", asset.spot),
                        volatility: format_percent(term.volatility, 1),
                        var_price: format!("{:.4}", term.var_price),
                        drawdown: format_percent(term.drawdown, 2),
                        parametric: format_percent(term.parametric.var, 2),
                    })
                })
                .collect();

            print_header(&format!(
                "Asset Term Risk ({}% VaR, seed {})",
                report.confidence_pct, report.seed
            ));
            print_table(&rows);
        }
    }

    Ok(())
}
