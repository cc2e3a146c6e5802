//! Market calibration from daily price history.
//!
//! Gaps are forward-filled, dates before every asset has a price are
//! dropped, and the parameters are estimated from daily log returns:
//!
//! - correlation: sample correlation of log returns
//! - volatility: `std(log returns)·sqrt(periods per year)`
//! - covariance: `cov(log returns)·periods per year`
//! - latest price: last aligned row
//! - window volatility: the volatility above over the trailing `days`
//!   returns of each configured window, omitted when the history is shorter

use std::collections::{BTreeMap, HashSet};

use lendvar_core::AssetSymbol;
use lendvar_math::statistics::{correlation_matrix, sample_covariance, sample_std_dev};
use serde::{Deserialize, Serialize};

use crate::asset_risk::RiskTerm;
use crate::error::{RiskError, RiskResult};
use crate::market::{MarketParameters, WindowVolatility};

/// Calibration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Observations per year used to annualize (365 for daily crypto data).
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: f64,

    /// Trailing windows to estimate volatility over.
    #[serde(default = "RiskTerm::defaults")]
    pub windows: Vec<RiskTerm>,
}

fn default_periods_per_year() -> f64 {
    365.0
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            periods_per_year: default_periods_per_year(),
            windows: RiskTerm::defaults(),
        }
    }
}

impl CalibrationConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the annualization factor.
    #[must_use]
    pub fn with_periods_per_year(mut self, periods: f64) -> Self {
        self.periods_per_year = periods;
        self
    }

    /// Builder method to replace the volatility windows.
    #[must_use]
    pub fn with_windows(mut self, windows: Vec<RiskTerm>) -> Self {
        self.windows = windows;
        self
    }
}

/// Daily closing prices, one row per date and one column per asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    assets: Vec<AssetSymbol>,
    dates: Vec<String>,
    rows: Vec<Vec<Option<f64>>>,
}

impl PriceHistory {
    /// Builds a history; `None` marks a missing observation.
    ///
    /// Every present price must be finite and positive.
    pub fn new(
        assets: Vec<AssetSymbol>,
        dates: Vec<String>,
        rows: Vec<Vec<Option<f64>>>,
    ) -> RiskResult<Self> {
        let mut seen = HashSet::with_capacity(assets.len());
        if let Some(dup) = assets.iter().find(|s| !seen.insert(*s)) {
            return Err(RiskError::input_shape(format!(
                "price history lists {dup} more than once"
            )));
        }
        if dates.len() != rows.len() {
            return Err(RiskError::input_shape(format!(
                "{} dates for {} price rows",
                dates.len(),
                rows.len()
            )));
        }
        for (date, row) in dates.iter().zip(&rows) {
            if row.len() != assets.len() {
                return Err(RiskError::input_shape(format!(
                    "row {date} has {} prices, expected {}",
                    row.len(),
                    assets.len()
                )));
            }
            for (symbol, price) in assets.iter().zip(row) {
                if let Some(p) = price {
                    if !p.is_finite() || *p <= 0.0 {
                        return Err(RiskError::InvalidInput(format!(
                            "{symbol} price on {date} must be positive, got {p}"
                        )));
                    }
                }
            }
        }

        Ok(Self {
            assets,
            dates,
            rows,
        })
    }

    /// Asset columns.
    pub fn assets(&self) -> &[AssetSymbol] {
        &self.assets
    }

    /// Row dates.
    pub fn dates(&self) -> &[String] {
        &self.dates
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the history has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Forward-filled rows, starting at the first date on which every asset
    /// has been priced.
    pub fn aligned(&self) -> (Vec<&str>, Vec<Vec<f64>>) {
        let mut last: Vec<Option<f64>> = vec![None; self.assets.len()];
        let mut dates = Vec::new();
        let mut rows = Vec::new();

        for (date, row) in self.dates.iter().zip(&self.rows) {
            for (slot, price) in last.iter_mut().zip(row) {
                if price.is_some() {
                    *slot = *price;
                }
            }
            if let Some(filled) = last.iter().copied().collect::<Option<Vec<f64>>>() {
                dates.push(date.as_str());
                rows.push(filled);
            }
        }
        (dates, rows)
    }
}

/// Estimates market parameters from `history`.
///
/// Needs at least three aligned rows (two returns). A constant price series
/// has zero volatility and zero correlation with every other asset.
pub fn calibrate(
    history: &PriceHistory,
    config: &CalibrationConfig,
) -> RiskResult<MarketParameters> {
    if !config.periods_per_year.is_finite() || config.periods_per_year <= 0.0 {
        return Err(RiskError::configuration(format!(
            "periods per year must be positive, got {}",
            config.periods_per_year
        )));
    }
    if history.assets().is_empty() {
        return Err(RiskError::InsufficientData(
            "price history has no assets".to_string(),
        ));
    }

    let (dates, rows) = history.aligned();
    if rows.len() < 3 {
        return Err(RiskError::InsufficientData(format!(
            "need at least 3 dates on which every asset is priced, got {}",
            rows.len()
        )));
    }

    let k = history.assets().len();
    let returns: Vec<Vec<f64>> = (0..k)
        .map(|j| rows.windows(2).map(|w| (w[1][j] / w[0][j]).ln()).collect())
        .collect();

    let correlation = correlation_matrix(&returns)?;
    let ppy = config.periods_per_year;

    let mut covariance = vec![vec![0.0; k]; k];
    for i in 0..k {
        for j in 0..=i {
            let cov = sample_covariance(&returns[i], &returns[j])? * ppy;
            covariance[i][j] = cov;
            covariance[j][i] = cov;
        }
    }

    let mut annual_volatility = BTreeMap::new();
    let mut latest_prices = BTreeMap::new();
    let latest = &rows[rows.len() - 1];
    for (j, symbol) in history.assets().iter().enumerate() {
        annual_volatility.insert(symbol.clone(), sample_std_dev(&returns[j])? * ppy.sqrt());
        latest_prices.insert(symbol.clone(), latest[j]);
    }

    let window_volatility =
        window_volatilities(history.assets(), &returns, &config.windows, ppy)?;

    tracing::debug!(
        assets = k,
        rows = rows.len(),
        dropped = history.len() - rows.len(),
        windows = window_volatility.len(),
        "calibrated market parameters"
    );

    Ok(MarketParameters {
        assets: history.assets().to_vec(),
        latest_prices,
        annual_volatility,
        correlation_matrix: correlation,
        covariance_matrix: Some(covariance),
        data_start: dates.first().map(|d| (*d).to_string()),
        data_end: dates.last().map(|d| (*d).to_string()),
        window_volatility,
    })
}

fn window_volatilities(
    assets: &[AssetSymbol],
    returns: &[Vec<f64>],
    windows: &[RiskTerm],
    ppy: f64,
) -> RiskResult<Vec<WindowVolatility>> {
    let available = returns.first().map_or(0, Vec::len);
    let mut out = Vec::with_capacity(windows.len());

    for window in windows {
        let days = window.days as usize;
        if days < 2 || days > available {
            tracing::debug!(
                window = %window.label,
                days,
                available,
                "skipping volatility window"
            );
            continue;
        }

        let mut volatility = BTreeMap::new();
        for (symbol, series) in assets.iter().zip(returns) {
            let trailing = &series[series.len() - days..];
            volatility.insert(symbol.clone(), sample_std_dev(trailing)? * ppy.sqrt());
        }
        out.push(WindowVolatility {
            label: window.label.clone(),
            days: window.days,
            volatility,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MarketModel;
    use approx::assert_relative_eq;

    fn sym(s: &str) -> AssetSymbol {
        AssetSymbol::new(s).unwrap()
    }

    fn dates(n: usize) -> Vec<String> {
        (1..=n).map(|d| format!("2024-01-{d:02}")).collect()
    }

    #[test]
    fn test_forward_fill_and_leading_gap() {
        let history = PriceHistory::new(
            vec![sym("A"), sym("B")],
            dates(4),
            vec![
                vec![Some(1.0), None],
                vec![Some(2.0), Some(10.0)],
                vec![None, Some(11.0)],
                vec![Some(4.0), None],
            ],
        )
        .unwrap();

        let (dates, rows) = history.aligned();
        assert_eq!(dates, vec!["2024-01-02", "2024-01-03", "2024-01-04"]);
        assert_eq!(rows, vec![vec![2.0, 10.0], vec![2.0, 11.0], vec![4.0, 11.0]]);
    }

    #[test]
    fn test_calibration_values() {
        // A doubles, halves, doubles; B is flat.
        let history = PriceHistory::new(
            vec![sym("A"), sym("B")],
            dates(4),
            vec![
                vec![Some(100.0), Some(1.0)],
                vec![Some(200.0), Some(1.0)],
                vec![Some(100.0), Some(1.0)],
                vec![Some(200.0), Some(1.0)],
            ],
        )
        .unwrap();

        let params = calibrate(&history, &CalibrationConfig::default()).unwrap();
        let ln2 = std::f64::consts::LN_2;
        // returns ln2, -ln2, ln2: mean ln2/3, sample variance 4·ln2²/3
        let daily_std = (4.0_f64 / 3.0).sqrt() * ln2;

        assert_relative_eq!(
            params.annual_volatility[&sym("A")],
            daily_std * 365.0_f64.sqrt(),
            epsilon = 1e-12
        );
        assert_eq!(params.annual_volatility[&sym("B")], 0.0);
        assert_eq!(params.correlation_matrix[0][1], 0.0);
        assert_eq!(params.correlation_matrix[1][1], 1.0);
        let cov = params.covariance_matrix.as_ref().unwrap();
        assert_relative_eq!(cov[0][0], daily_std * daily_std * 365.0, epsilon = 1e-9);
        assert_eq!(params.latest_prices[&sym("A")], 200.0);
        assert_eq!(params.data_start.as_deref(), Some("2024-01-01"));
        assert_eq!(params.data_end.as_deref(), Some("2024-01-04"));

        // Output feeds straight into a market model.
        let market = MarketModel::from_parameters(&params).unwrap();
        assert_eq!(market.len(), 2);
    }

    #[test]
    fn test_correlated_columns() {
        let a = [100.0, 101.0, 99.0, 102.0, 104.0, 103.0];
        let rows = a
            .iter()
            .map(|p| vec![Some(*p), Some(p * 2.0)])
            .collect::<Vec<_>>();
        let history = PriceHistory::new(vec![sym("X"), sym("Y")], dates(6), rows).unwrap();

        let params = calibrate(&history, &CalibrationConfig::default()).unwrap();
        assert_relative_eq!(params.correlation_matrix[0][1], 1.0, epsilon = 1e-9);
        assert_relative_eq!(
            params.annual_volatility[&sym("X")],
            params.annual_volatility[&sym("Y")],
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_trailing_window_volatility() {
        // Calm for 20 returns, then 4 swinging ones.
        let mut prices = vec![100.0];
        for i in 0..20 {
            let step = if i % 2 == 0 { 1.001 } else { 1.0 / 1.001 };
            prices.push(prices[prices.len() - 1] * step);
        }
        for i in 0..4 {
            let step = if i % 2 == 0 { 1.2 } else { 1.0 / 1.2 };
            prices.push(prices[prices.len() - 1] * step);
        }
        let rows = prices.iter().map(|p| vec![Some(*p)]).collect::<Vec<_>>();
        let dates = (0..rows.len()).map(|d| format!("d{d:02}")).collect();
        let history = PriceHistory::new(vec![sym("A")], dates, rows).unwrap();

        let config = CalibrationConfig::new().with_windows(vec![
            RiskTerm::new("Recent", 4),
            RiskTerm::new("All", 24),
            RiskTerm::new("TooLong", 25),
        ]);
        let params = calibrate(&history, &config).unwrap();

        let labels: Vec<&str> = params.window_volatility.iter().map(|w| w.label.as_str()).collect();
        assert_eq!(labels, vec!["Recent", "All"]);

        let recent = params.window_volatility[0].volatility[&sym("A")];
        let all = params.window_volatility[1].volatility[&sym("A")];
        assert_relative_eq!(all, params.annual_volatility[&sym("A")], epsilon = 1e-12);
        assert!(recent > 2.0 * all, "recent {recent} vs all {all}");

        // returns ±ln 1.2 alternating: mean 0, sample variance 4/3·ln²1.2
        let expected = (4.0_f64 / 3.0).sqrt() * 1.2_f64.ln() * 365.0_f64.sqrt();
        assert_relative_eq!(recent, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_insufficient_and_invalid_history() {
        let short = PriceHistory::new(
            vec![sym("A")],
            dates(2),
            vec![vec![Some(1.0)], vec![Some(1.1)]],
        )
        .unwrap();
        assert!(matches!(
            calibrate(&short, &CalibrationConfig::default()),
            Err(RiskError::InsufficientData(_))
        ));

        assert!(PriceHistory::new(vec![sym("A")], dates(1), vec![vec![Some(0.0)]]).is_err());
        assert!(PriceHistory::new(vec![sym("A")], dates(2), vec![vec![Some(1.0)]]).is_err());
        assert!(PriceHistory::new(
            vec![sym("A"), sym("A")],
            dates(1),
            vec![vec![Some(1.0), Some(1.0)]]
        )
        .is_err());
    }
}
