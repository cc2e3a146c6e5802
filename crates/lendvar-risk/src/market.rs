//! Market model: spot prices, volatilities and the correlation structure.
//!
//! A correlation matrix relates assets by position, not by symbol. The
//! [`MarketModel`] therefore owns the asset ordering the matrix was built
//! from, and every later stage (path generation, revaluation columns)
//! uses exactly that ordering.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use lendvar_core::{AssetSymbol, DataQualityIssue, Diagnostics};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{RiskError, RiskResult};

/// Tolerance for symmetry, unit diagonal and entry range checks.
pub const CORRELATION_TOLERANCE: f64 = 1e-8;

/// Market parameters as produced by calibration and stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketParameters {
    /// Asset ordering of `correlation_matrix`.
    pub assets: Vec<AssetSymbol>,
    /// Latest price per asset.
    pub latest_prices: BTreeMap<AssetSymbol, f64>,
    /// Annualized volatility per asset.
    pub annual_volatility: BTreeMap<AssetSymbol, f64>,
    /// Pairwise correlation of daily log returns, in `assets` order.
    pub correlation_matrix: Vec<Vec<f64>>,
    /// Annualized covariance of daily log returns, in `assets` order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub covariance_matrix: Option<Vec<Vec<f64>>>,
    /// First date of the history the parameters were estimated from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_start: Option<String>,
    /// Last date of the history the parameters were estimated from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_end: Option<String>,
    /// Annualized volatility over trailing windows of the history.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub window_volatility: Vec<WindowVolatility>,
}

/// Annualized volatility estimated over the trailing `days` of a history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowVolatility {
    /// Window label, e.g. `Short`.
    pub label: String,
    /// Window length in daily returns.
    pub days: u32,
    /// Volatility per asset.
    pub volatility: BTreeMap<AssetSymbol, f64>,
}

/// One simulated asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Asset symbol.
    pub symbol: AssetSymbol,
    /// Spot price; zero for a delisted or unpriced asset.
    pub spot: f64,
    /// Annualized volatility.
    pub volatility: f64,
}

/// Validated market state for one simulation run.
#[derive(Debug, Clone)]
pub struct MarketModel {
    assets: Vec<Asset>,
    index: HashMap<AssetSymbol, usize>,
    correlation: DMatrix<f64>,
    window_volatility: Vec<WindowVolatility>,
    diagnostics: Diagnostics,
}

impl MarketModel {
    /// Builds a market model from an asset ordering, per-symbol prices and
    /// volatilities, and a correlation matrix in the same ordering.
    ///
    /// A correlation side that disagrees with the ordering, or a duplicated
    /// symbol, is [`RiskError::InputShape`]. A malformed matrix (ragged or
    /// non-square rows, asymmetry, bad diagonal or entries) and negative or
    /// non-finite prices or volatilities are [`RiskError::Configuration`]. An asset without a price or volatility
    /// is simulated with zero and recorded as a diagnostic, as is any map
    /// entry for a symbol outside the ordering.
    pub fn new(
        ordering: Vec<AssetSymbol>,
        prices: &BTreeMap<AssetSymbol, f64>,
        volatilities: &BTreeMap<AssetSymbol, f64>,
        correlation: DMatrix<f64>,
    ) -> RiskResult<Self> {
        if ordering.is_empty() {
            return Err(RiskError::configuration("market has no assets"));
        }

        let mut index = HashMap::with_capacity(ordering.len());
        for (i, symbol) in ordering.iter().enumerate() {
            if index.insert(symbol.clone(), i).is_some() {
                return Err(RiskError::input_shape(format!(
                    "asset ordering lists {symbol} more than once"
                )));
            }
        }

        validate_correlation(&correlation, ordering.len())?;

        for (kind, map) in [("price", prices), ("volatility", volatilities)] {
            for (symbol, &value) in map {
                if index.contains_key(symbol) && (!value.is_finite() || value < 0.0) {
                    return Err(RiskError::configuration(format!(
                        "{kind} for {symbol} must be finite and non-negative, got {value}"
                    )));
                }
            }
        }

        let mut diagnostics = Diagnostics::new();
        let assets = ordering
            .into_iter()
            .map(|symbol| {
                let spot = prices.get(&symbol).copied().unwrap_or_else(|| {
                    diagnostics.record(DataQualityIssue::MissingSpotPrice {
                        symbol: symbol.clone(),
                    });
                    0.0
                });
                let volatility = volatilities.get(&symbol).copied().unwrap_or_else(|| {
                    diagnostics.record(DataQualityIssue::MissingVolatility {
                        symbol: symbol.clone(),
                    });
                    0.0
                });
                Asset {
                    symbol,
                    spot,
                    volatility,
                }
            })
            .collect();

        let unused: BTreeSet<&AssetSymbol> = prices
            .keys()
            .chain(volatilities.keys())
            .filter(|symbol| !index.contains_key(*symbol))
            .collect();
        for symbol in unused {
            diagnostics.record(DataQualityIssue::UnusedMarketEntry {
                symbol: symbol.clone(),
            });
        }

        Ok(Self {
            assets,
            index,
            correlation,
            window_volatility: Vec::new(),
            diagnostics,
        })
    }

    /// Builds a market model from serialized [`MarketParameters`].
    pub fn from_parameters(parameters: &MarketParameters) -> RiskResult<Self> {
        let correlation = matrix_from_rows(&parameters.correlation_matrix)?;
        Self::new(
            parameters.assets.clone(),
            &parameters.latest_prices,
            &parameters.annual_volatility,
            correlation,
        )?
        .with_window_volatility(parameters.window_volatility.clone())
    }

    /// Attaches trailing-window volatilities, used by term risk in place of
    /// the annual volatility for terms of matching length.
    ///
    /// Entries for symbols outside the model are ignored.
    pub fn with_window_volatility(mut self, windows: Vec<WindowVolatility>) -> RiskResult<Self> {
        for window in &windows {
            for (symbol, &vol) in &window.volatility {
                if self.index.contains_key(symbol) && (!vol.is_finite() || vol < 0.0) {
                    return Err(RiskError::configuration(format!(
                        "{} window volatility for {symbol} must be finite and non-negative, got {vol}",
                        window.label
                    )));
                }
            }
        }
        self.window_volatility = windows;
        Ok(self)
    }

    /// Trailing-window volatilities attached to the model.
    pub fn window_volatility(&self) -> &[WindowVolatility] {
        &self.window_volatility
    }

    /// Volatility of `symbol` estimated over a window of `days`, if any.
    pub fn term_volatility(&self, symbol: &AssetSymbol, days: u32) -> Option<f64> {
        self.window_volatility
            .iter()
            .find(|w| w.days == days)
            .and_then(|w| w.volatility.get(symbol).copied())
    }

    /// A market of independent assets (identity correlation).
    pub fn uncorrelated(assets: Vec<Asset>) -> RiskResult<Self> {
        let n = assets.len();
        let ordering = assets.iter().map(|a| a.symbol.clone()).collect();
        let prices = assets.iter().map(|a| (a.symbol.clone(), a.spot)).collect();
        let vols = assets
            .iter()
            .map(|a| (a.symbol.clone(), a.volatility))
            .collect();
        Self::new(ordering, &prices, &vols, DMatrix::identity(n, n))
    }

    /// Assets in correlation order.
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// Symbols in correlation order.
    pub fn symbols(&self) -> Vec<AssetSymbol> {
        self.assets.iter().map(|a| a.symbol.clone()).collect()
    }

    /// Position of `symbol` in the ordering.
    pub fn index_of(&self, symbol: &AssetSymbol) -> Option<usize> {
        self.index.get(symbol).copied()
    }

    /// Asset by symbol.
    pub fn asset(&self, symbol: &AssetSymbol) -> Option<&Asset> {
        self.index_of(symbol).map(|i| &self.assets[i])
    }

    /// The correlation matrix.
    pub fn correlation(&self) -> &DMatrix<f64> {
        &self.correlation
    }

    /// Defaults and ignored entries found while building the model.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Always false: a model has at least one asset.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// The same market re-keyed to `order`, which must list every symbol of
    /// the model exactly once. Rows and columns of the correlation matrix
    /// move with their assets.
    pub fn permuted(&self, order: &[AssetSymbol]) -> RiskResult<Self> {
        if order.len() != self.len() {
            return Err(RiskError::input_shape(format!(
                "permutation lists {} assets, market has {}",
                order.len(),
                self.len()
            )));
        }

        let mut source = Vec::with_capacity(order.len());
        let mut index = HashMap::with_capacity(order.len());
        for (i, symbol) in order.iter().enumerate() {
            let from = self.index_of(symbol).ok_or_else(|| {
                RiskError::input_shape(format!("{symbol} is not part of the market"))
            })?;
            if index.insert(symbol.clone(), i).is_some() {
                return Err(RiskError::input_shape(format!(
                    "permutation lists {symbol} more than once"
                )));
            }
            source.push(from);
        }

        let n = order.len();
        let correlation =
            DMatrix::from_fn(n, n, |i, j| self.correlation[(source[i], source[j])]);
        let assets = source.iter().map(|&from| self.assets[from].clone()).collect();

        Ok(Self {
            assets,
            index,
            correlation,
            window_volatility: self.window_volatility.clone(),
            diagnostics: self.diagnostics.clone(),
        })
    }
}

/// Converts nested rows into a matrix, rejecting ragged input.
pub fn matrix_from_rows(rows: &[Vec<f64>]) -> RiskResult<DMatrix<f64>> {
    let n = rows.len();
    let cols = rows.first().map_or(0, Vec::len);
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != cols) {
        return Err(RiskError::configuration(format!(
            "correlation row {i} has {} entries, expected {cols}",
            row.len()
        )));
    }
    Ok(DMatrix::from_fn(n, cols, |i, j| rows[i][j]))
}

fn validate_correlation(matrix: &DMatrix<f64>, assets: usize) -> RiskResult<()> {
    if !matrix.is_square() {
        return Err(RiskError::configuration(format!(
            "correlation matrix is {}x{}, not square",
            matrix.nrows(),
            matrix.ncols()
        )));
    }
    if matrix.nrows() != assets {
        return Err(RiskError::input_shape(format!(
            "correlation matrix covers {} assets, ordering has {assets}",
            matrix.nrows()
        )));
    }

    for i in 0..assets {
        for j in 0..assets {
            let value = matrix[(i, j)];
            if !value.is_finite() || value.abs() > 1.0 + CORRELATION_TOLERANCE {
                return Err(RiskError::configuration(format!(
                    "correlation entry ({i}, {j}) = {value} is outside [-1, 1]"
                )));
            }
        }
        if (matrix[(i, i)] - 1.0).abs() > CORRELATION_TOLERANCE {
            return Err(RiskError::configuration(format!(
                "correlation diagonal entry {i} is {}, expected 1",
                matrix[(i, i)]
            )));
        }
        for j in 0..i {
            if (matrix[(i, j)] - matrix[(j, i)]).abs() > CORRELATION_TOLERANCE {
                return Err(RiskError::configuration(format!(
                    "correlation matrix is not symmetric at ({i}, {j})"
                )));
            }
        }
    }
    Ok(())
}
