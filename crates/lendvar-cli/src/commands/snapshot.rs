//! Snapshot command implementation.
//!
//! Reports protocol bad debt at current prices, attributed to debt assets.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tabled::Tabled;

use lendvar_portfolio::{current_bad_debt, Portfolio, RevaluationConfig};

use crate::cli::OutputFormat;
use crate::io::{read_market, read_positions};
use crate::output::{
    format_percent, format_usd, print_diagnostics, print_header, print_json, print_table, KeyValue,
};

/// Arguments for the snapshot command.
#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Positions CSV (user_id,symbol,collateral_amount,debt_amount,is_collateral,price)
    #[arg(short, long)]
    pub positions: PathBuf,

    /// Market parameters JSON; its latest prices replace the recorded ones
    #[arg(short, long)]
    pub market: Option<PathBuf>,
}

#[derive(Tabled)]
struct SymbolRow {
    #[tabled(rename = "Debt Asset")]
    symbol: String,
    #[tabled(rename = "Bad Debt")]
    bad_debt: String,
    #[tabled(rename = "Share")]
    share: String,
    #[tabled(rename = "Accounts")]
    accounts: usize,
}

/// Execute the snapshot command.
pub fn execute(args: SnapshotArgs, format: OutputFormat) -> Result<()> {
    let portfolio = Portfolio::from_records(read_positions(&args.positions)?)?;
    let prices = match &args.market {
        Some(path) => read_market(path)?.latest_prices,
        None => BTreeMap::new(),
    };

    let snapshot = current_bad_debt(&portfolio, &prices, &RevaluationConfig::new());

    match format {
        OutputFormat::Json => print_json(&snapshot)?,
        OutputFormat::Table => {
            let results = vec![
                KeyValue::new("Accounts", snapshot.accounts.to_string()),
                KeyValue::new("Active Accounts", snapshot.active_accounts.to_string()),
                KeyValue::new("Insolvent Accounts", snapshot.insolvent_accounts.to_string()),
                KeyValue::from_usd("Total Collateral", snapshot.total_collateral_value),
                KeyValue::from_usd("Total Debt", snapshot.total_debt_value),
                KeyValue::from_usd("Total Bad Debt", snapshot.total_bad_debt),
            ];
            print_header("Current Bad Debt");
            print_table(&results);

            if !snapshot.by_symbol.is_empty() {
                let rows: Vec<SymbolRow> = snapshot
                    .by_symbol
                    .iter()
                    .map(|(symbol, entry)| SymbolRow {
                        symbol: symbol.to_string(),
                        bad_debt: format_usd(entry.bad_debt),
                        share: format_percent(entry.bad_debt / snapshot.total_bad_debt, 2),
                        accounts: entry.accounts,
                    })
                    .collect();
                print_header("Bad Debt by Asset");
                print_table(&rows);
            }
            print_diagnostics(&snapshot.diagnostics);
        }
    }

    Ok(())
}
