//! Input file readers.
//!
//! - positions CSV: `user_id,symbol,collateral_amount,debt_amount,is_collateral,price`
//! - market JSON: serialized [`MarketParameters`]
//! - prices CSV: a `date` column followed by one column per asset, empty
//!   cells for missing prices
//! - simulation config TOML: [`SimulationConfig`] fields, all optional

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use lendvar_core::{AccountId, AssetSymbol};
use lendvar_portfolio::PositionRecord;
use lendvar_risk::{MarketParameters, SimulationConfig};
use serde::Deserialize;

use crate::error::{CliError, CliResult};

/// Raw price history as read from CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    pub assets: Vec<AssetSymbol>,
    pub dates: Vec<String>,
    pub rows: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct PositionRow {
    user_id: String,
    symbol: String,
    collateral_amount: f64,
    debt_amount: f64,
    is_collateral: String,
    price: f64,
}

/// Parses the boolean spellings pandas and hand-written files use.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim() {
        "True" | "true" | "TRUE" | "1" => Some(true),
        "False" | "false" | "FALSE" | "0" => Some(false),
        _ => None,
    }
}

fn open(path: &Path) -> CliResult<File> {
    File::open(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn csv_reader(path: &Path) -> CliResult<csv::Reader<File>> {
    Ok(csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(open(path)?))
}

/// Reads position records; columns beyond the six required are ignored.
pub fn read_positions(path: &Path) -> CliResult<Vec<PositionRecord>> {
    let csv_error = |source: csv::Error| CliError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv_reader(path)?;
    let headers = reader.headers().map_err(csv_error)?.clone();

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_error)?;
        let line = record.position().map_or(0, csv::Position::line);
        let invalid = |reason: String| CliError::InvalidCell {
            path: path.to_path_buf(),
            line,
            reason,
        };

        let row: PositionRow = record.deserialize(Some(&headers)).map_err(csv_error)?;
        let is_collateral = parse_flag(&row.is_collateral)
            .ok_or_else(|| invalid(format!("is_collateral '{}' is not a boolean", row.is_collateral)))?;

        records.push(PositionRecord {
            account_id: AccountId::new(&row.user_id).map_err(|e| invalid(e.to_string()))?,
            symbol: AssetSymbol::new(&row.symbol).map_err(|e| invalid(e.to_string()))?,
            collateral_amount: row.collateral_amount,
            debt_amount: row.debt_amount,
            is_collateral,
            reference_price: row.price,
        });
    }

    tracing::debug!(path = %path.display(), positions = records.len(), "read positions");
    Ok(records)
}

/// Reads daily prices.
pub fn read_prices(path: &Path) -> CliResult<PriceTable> {
    let csv_error = |source: csv::Error| CliError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv_reader(path)?;
    let headers = reader.headers().map_err(csv_error)?.clone();
    if !headers.get(0).is_some_and(|h| h.eq_ignore_ascii_case("date")) {
        return Err(CliError::InvalidCell {
            path: path.to_path_buf(),
            line: 1,
            reason: "first column must be 'date'".to_string(),
        });
    }
    let assets = headers
        .iter()
        .skip(1)
        .map(AssetSymbol::new)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| CliError::InvalidCell {
            path: path.to_path_buf(),
            line: 1,
            reason: e.to_string(),
        })?;

    let mut dates = Vec::new();
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_error)?;
        let line = record.position().map_or(0, csv::Position::line);

        let mut fields = record.iter();
        dates.push(fields.next().unwrap_or_default().to_string());
        let row = fields
            .map(parse_price)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| CliError::InvalidCell {
                path: path.to_path_buf(),
                line,
                reason,
            })?;
        rows.push(row);
    }

    tracing::debug!(path = %path.display(), assets = assets.len(), rows = rows.len(), "read prices");
    Ok(PriceTable {
        assets,
        dates,
        rows,
    })
}

fn parse_price(cell: &str) -> Result<Option<f64>, String> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    cell.parse::<f64>()
        .map(Some)
        .map_err(|_| format!("'{cell}' is not a number"))
}

/// Reads market parameters.
pub fn read_market(path: &Path) -> CliResult<MarketParameters> {
    serde_json::from_reader(BufReader::new(open(path)?)).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a simulation config; missing fields take their defaults.
pub fn read_config(path: &Path) -> CliResult<SimulationConfig> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| CliError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_flag() {
        for yes in ["True", "true", "1", " TRUE "] {
            assert_eq!(parse_flag(yes), Some(true));
        }
        for no in ["False", "false", "0"] {
            assert_eq!(parse_flag(no), Some(false));
        }
        assert_eq!(parse_flag("yes"), None);
    }

    #[test]
    fn test_read_positions_with_extra_columns() {
        let file = write_temp(
            "user_id,symbol,collateral_amount,debt_amount,is_collateral,price,value_usd\n\
             0xa,WETH,2.0,0.0,True,3000.0,6000.0\n\
             0xa,USDC,0.0,1500.0,False,1.0,1500.0\n",
        );
        let records = read_positions(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].is_collateral);
        assert!(!records[1].is_collateral);
        assert_eq!(records[1].debt_amount, 1500.0);
        assert_eq!(records[0].symbol.as_str(), "WETH");
    }

    #[test]
    fn test_read_positions_rejects_bad_flag() {
        let file = write_temp(
            "user_id,symbol,collateral_amount,debt_amount,is_collateral,price\n\
             0xa,WETH,1.0,0.0,maybe,3000.0\n",
        );
        let err = read_positions(file.path()).unwrap_err();
        assert!(matches!(err, CliError::InvalidCell { line: 2, .. }));
    }

    #[test]
    fn test_read_prices_with_gaps() {
        let file = write_temp(
            "date,WETH,USDC\n2024-01-01,3000.5,\n2024-01-02,3010,1.0\n2024-01-03,nan,0.999\n",
        );
        let table = read_prices(file.path()).unwrap();
        assert_eq!(table.assets.len(), 2);
        assert_eq!(table.dates, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);
        assert_eq!(table.rows[0], vec![Some(3000.5), None]);
        assert_eq!(table.rows[2], vec![None, Some(0.999)]);
    }

    #[test]
    fn test_read_config_partial() {
        let file = write_temp("scenarios = 250\nseed = 9\nscheme = \"closed-form\"\n");
        let config = read_config(file.path()).unwrap();
        assert_eq!(config.scenarios, 250);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.steps, 365);
    }

    #[test]
    fn test_missing_file() {
        let err = read_market(Path::new("/nonexistent/market.json")).unwrap_err();
        assert!(matches!(err, CliError::Read { .. }));
    }
}
