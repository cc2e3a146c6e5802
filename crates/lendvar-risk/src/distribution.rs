//! Shortfall distribution and tail statistics.
//!
//! VaR estimates the loss not exceeded at a given confidence level over the
//! simulation horizon. Here the loss is the protocol-wide bad debt of a
//! scenario, and VaR is read off the empirical distribution.

use lendvar_math::statistics::{mean, percentile_sorted};
use serde::{Deserialize, Serialize};

use crate::error::{RiskError, RiskResult};

/// Value at Risk result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VaRResult {
    /// The VaR value: a currency amount for Monte Carlo, a return fraction
    /// for parametric estimates.
    pub var: f64,
    /// Confidence level in percent (e.g. 99.9)
    pub confidence_pct: f64,
    /// Time horizon in days
    pub horizon_days: u32,
    /// Method used for calculation
    pub method: VaRMethod,
}

/// VaR calculation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaRMethod {
    /// Parametric (normal quantile times volatility)
    Parametric,
    /// Monte Carlo simulation
    MonteCarlo,
}

impl std::fmt::Display for VaRResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.method {
            VaRMethod::MonteCarlo => write!(
                f,
                "VaR({}%, {}d): ${:.2}",
                self.confidence_pct, self.horizon_days, self.var
            ),
            VaRMethod::Parametric => write!(
                f,
                "VaR({}%, {}d): {:.4}%",
                self.confidence_pct,
                self.horizon_days,
                self.var * 100.0
            ),
        }
    }
}

/// Tail statistics of a shortfall distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TailRiskSummary {
    /// Shortfall at `confidence_pct`.
    pub var: f64,
    /// Confidence level in percent.
    pub confidence_pct: f64,
    /// Mean shortfall.
    pub mean: f64,
    /// Largest shortfall observed.
    pub max: f64,
    /// Number of scenarios.
    pub scenarios: usize,
}

/// Equal-width histogram of a distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// `bins + 1` ascending bin edges.
    pub edges: Vec<f64>,
    /// Observation count per bin; the last bin includes its right edge.
    pub counts: Vec<usize>,
}

/// Protocol shortfall of every scenario of a run, in scenario order.
///
/// Serializes as the plain list of shortfalls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct ShortfallDistribution {
    values: Vec<f64>,
    sorted: Vec<f64>,
}

impl TryFrom<Vec<f64>> for ShortfallDistribution {
    type Error = RiskError;

    fn try_from(values: Vec<f64>) -> RiskResult<Self> {
        Self::new(values)
    }
}

impl From<ShortfallDistribution> for Vec<f64> {
    fn from(distribution: ShortfallDistribution) -> Self {
        distribution.values
    }
}

impl ShortfallDistribution {
    /// Wraps per-scenario shortfalls.
    ///
    /// Fails on an empty input or on any negative or non-finite value.
    pub fn new(values: Vec<f64>) -> RiskResult<Self> {
        if values.is_empty() {
            return Err(RiskError::InsufficientData(
                "shortfall distribution has no scenarios".to_string(),
            ));
        }
        if let Some((i, v)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(RiskError::InvalidInput(format!(
                "scenario {i} has shortfall {v}; shortfalls must be finite and non-negative"
            )));
        }

        let mut sorted = values.clone();
        sorted.sort_by(f64::total_cmp);
        Ok(Self { values, sorted })
    }

    /// Shortfalls in scenario order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of scenarios.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false: a distribution has at least one scenario.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn sorted(&self) -> &[f64] {
        &self.sorted
    }

    /// Shortfall at confidence `confidence_pct` (percent, in `[0, 100]`),
    /// interpolated linearly between order statistics.
    pub fn var(&self, confidence_pct: f64) -> RiskResult<f64> {
        if !(0.0..=100.0).contains(&confidence_pct) {
            return Err(RiskError::InvalidInput(format!(
                "confidence must be within [0, 100] percent, got {confidence_pct}"
            )));
        }
        Ok(percentile_sorted(self.sorted(), confidence_pct)?)
    }

    /// Mean shortfall.
    pub fn mean(&self) -> f64 {
        mean(&self.values).unwrap_or(0.0)
    }

    /// Largest shortfall.
    pub fn max(&self) -> f64 {
        self.sorted().last().copied().unwrap_or(0.0)
    }

    /// VaR, mean and max at `confidence_pct`.
    pub fn summary(&self, confidence_pct: f64) -> RiskResult<TailRiskSummary> {
        Ok(TailRiskSummary {
            var: self.var(confidence_pct)?,
            confidence_pct,
            mean: self.mean(),
            max: self.max(),
            scenarios: self.len(),
        })
    }

    /// VaR at `confidence_pct` tagged with its horizon.
    pub fn var_result(&self, confidence_pct: f64, horizon_days: u32) -> RiskResult<VaRResult> {
        Ok(VaRResult {
            var: self.var(confidence_pct)?,
            confidence_pct,
            horizon_days,
            method: VaRMethod::MonteCarlo,
        })
    }

    /// Counts of shortfalls in `bins` equal-width bins spanning the observed
    /// range. A distribution with a single distinct value is centred in a
    /// range of width one.
    pub fn histogram(&self, bins: usize) -> RiskResult<Histogram> {
        if bins == 0 {
            return Err(RiskError::InvalidInput(
                "histogram needs at least one bin".to_string(),
            ));
        }

        let sorted = self.sorted();
        let (mut lo, mut hi) = (sorted[0], sorted[sorted.len() - 1]);
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
        let mut counts = vec![0; bins];
        for &v in &self.values {
            let bin = (((v - lo) / width) as usize).min(bins - 1);
            counts[bin] += 1;
        }

        Ok(Histogram { edges, counts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn dist(values: &[f64]) -> ShortfallDistribution {
        ShortfallDistribution::new(values.to_vec()).unwrap()
    }

    #[test]
    fn test_summary_statistics() {
        let d = dist(&[0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0, 0.0, 0.0, 90.0]);
        let summary = d.summary(99.9).unwrap();

        assert_eq!(summary.scenarios, 10);
        assert_relative_eq!(summary.mean, 10.0);
        assert_relative_eq!(summary.max, 90.0);
        // rank 8.991 between 10 and 90
        assert_relative_eq!(summary.var, 10.0 + 0.991 * 80.0, epsilon = 1e-9);
        assert_relative_eq!(d.var(50.0).unwrap(), 0.0);
        assert_relative_eq!(d.var(100.0).unwrap(), 90.0);
    }

    #[test]
    fn test_scenario_order_preserved() {
        let d = dist(&[3.0, 1.0, 2.0]);
        assert_eq!(d.values(), &[3.0, 1.0, 2.0]);
        assert_relative_eq!(d.var(0.0).unwrap(), 1.0);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(ShortfallDistribution::new(Vec::new()).is_err());
        assert!(ShortfallDistribution::new(vec![1.0, -0.5]).is_err());
        assert!(ShortfallDistribution::new(vec![f64::NAN]).is_err());

        let d = dist(&[1.0, 2.0]);
        assert!(d.var(-1.0).is_err());
        assert!(d.var(100.01).is_err());
        assert!(d.histogram(0).is_err());
    }

    #[test]
    fn test_histogram_counts_everything() {
        let d = dist(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 10.0]);
        let h = d.histogram(5).unwrap();

        assert_eq!(h.edges.len(), 6);
        assert_relative_eq!(h.edges[0], 0.0);
        assert_relative_eq!(h.edges[5], 10.0);
        assert_eq!(h.counts, vec![2, 2, 2, 2, 2]);
        assert_eq!(h.counts.iter().sum::<usize>(), d.len());
    }

    #[test]
    fn test_histogram_degenerate_range() {
        let d = dist(&[0.0; 4]);
        let h = d.histogram(2).unwrap();
        assert_relative_eq!(h.edges[0], -0.5);
        assert_relative_eq!(h.edges[2], 0.5);
        assert_eq!(h.counts, vec![0, 4]);
    }

    #[test]
    fn test_json_is_plain_list() {
        let d = dist(&[2.0, 0.0, 1.5]);
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, "[2.0,0.0,1.5]");

        let back: ShortfallDistribution = serde_json::from_str(&json).unwrap();
        assert_relative_eq!(back.max(), 2.0);
        assert!(serde_json::from_str::<ShortfallDistribution>("[-1.0]").is_err());
    }

    #[test]
    fn test_var_result_display() {
        let d = dist(&[0.0, 100.0]);
        let result = d.var_result(50.0, 365).unwrap();
        assert_eq!(result.method, VaRMethod::MonteCarlo);
        assert_eq!(result.to_string(), "VaR(50%, 365d): $50.00");
    }
}
