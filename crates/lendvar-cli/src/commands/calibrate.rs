//! Calibrate command implementation.
//!
//! Estimates market parameters from a daily price CSV.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tabled::Tabled;

use lendvar_risk::{calibrate, CalibrationConfig, PriceHistory};

use crate::cli::OutputFormat;
use crate::commands::terms_from_days;
use crate::io::read_prices;
use crate::output::{format_percent, print_header, print_json, print_table, KeyValue};

/// Arguments for the calibrate command.
#[derive(Args, Debug)]
pub struct CalibrateArgs {
    /// Daily prices CSV: a date column, then one column per asset
    #[arg(short, long)]
    pub prices: PathBuf,

    /// Write the market parameters JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Observations per year used to annualize
    #[arg(long, default_value = "365")]
    pub periods_per_year: f64,

    /// Trailing volatility windows in days, comma separated
    #[arg(long, value_delimiter = ',', default_values_t = [30, 90, 365])]
    pub windows: Vec<u32>,
}

#[derive(Tabled)]
struct AssetRow {
    #[tabled(rename = "Asset")]
    symbol: String,
    #[tabled(rename = "Latest Price")]
    latest: String,
    #[tabled(rename = "Annual Volatility")]
    volatility: String,
}

#[derive(Tabled)]
struct WindowRow {
    #[tabled(rename = "Asset")]
    symbol: String,
    #[tabled(rename = "Window")]
    window: String,
    #[tabled(rename = "Volatility")]
    volatility: String,
}

/// Execute the calibrate command.
pub fn execute(args: CalibrateArgs, format: OutputFormat) -> Result<()> {
    let table = read_prices(&args.prices)?;
    let history = PriceHistory::new(table.assets, table.dates, table.rows)?;
    let config = CalibrationConfig::new()
        .with_periods_per_year(args.periods_per_year)
        .with_windows(terms_from_days(&args.windows)?);
    let params = calibrate(&history, &config)?;

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&params)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    }

    match format {
        OutputFormat::Json => print_json(&params)?,
        OutputFormat::Table => {
            let window = KeyValue::new(
                "Data Window",
                format!(
                    "{} to {}",
                    params.data_start.as_deref().unwrap_or("?"),
                    params.data_end.as_deref().unwrap_or("?")
                ),
            );
            print_header("Calibrated Market");
            print_table(&[window]);

            let rows: Vec<AssetRow> = params
                .assets
                .iter()
                .map(|symbol| AssetRow {
                    symbol: symbol.to_string(),
                    latest: params
                        .latest_prices
                        .get(symbol)
                        .map_or_else(|| "-".to_string(), |p| format!("{p:.4}")),
                    volatility: params
                        .annual_volatility
                        .get(symbol)
                        .map_or_else(|| "-".to_string(), |v| format_percent(*v, 2)),
                })
                .collect();
            print_table(&rows);

            let windows: Vec<WindowRow> = params
                .window_volatility
                .iter()
                .flat_map(|w| {
                    w.volatility.iter().map(move |(symbol, vol)| WindowRow {
                        symbol: symbol.to_string(),
                        window: format!("{} ({}d)", w.label, w.days),
                        volatility: format_percent(*vol, 2),
                    })
                })
                .collect();
            if !windows.is_empty() {
                print_header("Window Volatility");
                print_table(&windows);
            }
        }
    }

    Ok(())
}
