//! Per-asset term risk.
//!
//! Each asset is simulated on its own (zero drift) over a set of terms. For
//! every term the price level at the lower tail of the terminal distribution
//! is reported: at 99.9% confidence, the 0.1th percentile of simulated
//! terminal prices. A parametric one-day VaR of the asset's return,
//! `Φ⁻¹(p)·sigma/sqrt(365)`, complements the simulation.
//!
//! A term uses the volatility calibrated over a trailing window of the same
//! length when the market carries one, and the annual volatility otherwise.

use lendvar_core::AssetSymbol;
use lendvar_math::statistics::percentile;
use lendvar_portfolio::{maybe_parallel_map, RevaluationConfig};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::config::SimulationConfig;
use crate::distribution::{VaRMethod, VaRResult};
use crate::error::{RiskError, RiskResult};
use crate::market::{Asset, MarketModel};
use crate::paths::{block_seed, CorrelatedPathGenerator};

/// A named simulation term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskTerm {
    /// Display label.
    pub label: String,
    /// Term length in days; also the number of daily steps.
    pub days: u32,
}

impl RiskTerm {
    /// Creates a term.
    pub fn new(label: impl Into<String>, days: u32) -> Self {
        Self {
            label: label.into(),
            days,
        }
    }

    /// 30 days.
    pub fn short() -> Self {
        Self::new("Short", 30)
    }

    /// 90 days.
    pub fn mid() -> Self {
        Self::new("Mid", 90)
    }

    /// 365 days.
    pub fn long() -> Self {
        Self::new("Long", 365)
    }

    /// Short, Mid and Long.
    pub fn defaults() -> Vec<Self> {
        vec![Self::short(), Self::mid(), Self::long()]
    }

    /// Term length in years.
    pub fn horizon_years(&self) -> f64 {
        f64::from(self.days) / 365.0
    }
}

/// Settings for a term risk run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRiskConfig {
    /// Scenarios per asset and term.
    #[serde(default = "default_scenarios")]
    pub scenarios: usize,

    /// Confidence level in percent, strictly between 0 and 100.
    #[serde(default = "default_var_percentile")]
    pub var_percentile: f64,

    /// Random seed (None = random).
    #[serde(default)]
    pub seed: Option<u64>,

    /// Terms to simulate.
    #[serde(default = "RiskTerm::defaults")]
    pub terms: Vec<RiskTerm>,

    /// Enable parallel processing.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_scenarios() -> usize {
    10_000
}

fn default_var_percentile() -> f64 {
    99.9
}

fn default_parallel() -> bool {
    true
}

impl Default for AssetRiskConfig {
    fn default() -> Self {
        Self {
            scenarios: default_scenarios(),
            var_percentile: default_var_percentile(),
            seed: None,
            terms: RiskTerm::defaults(),
            parallel: default_parallel(),
        }
    }
}

impl AssetRiskConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the scenario count.
    #[must_use]
    pub fn with_scenarios(mut self, scenarios: usize) -> Self {
        self.scenarios = scenarios;
        self
    }

    /// Builder method to set the confidence in percent.
    #[must_use]
    pub fn with_var_percentile(mut self, percentile: f64) -> Self {
        self.var_percentile = percentile;
        self
    }

    /// Builder method to fix the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builder method to replace the terms.
    #[must_use]
    pub fn with_terms(mut self, terms: Vec<RiskTerm>) -> Self {
        self.terms = terms;
        self
    }

    /// Builder method to enable or disable parallel processing.
    #[must_use]
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Checks every setting, reporting all problems at once.
    pub fn validate(&self) -> RiskResult<()> {
        let mut problems = Vec::new();
        if self.scenarios == 0 {
            problems.push("scenarios must be at least 1".to_string());
        }
        if !(self.var_percentile > 0.0 && self.var_percentile < 100.0) {
            problems.push(format!(
                "VaR percentile must be within (0, 100), got {}",
                self.var_percentile
            ));
        }
        if self.terms.is_empty() {
            problems.push("at least one term is required".to_string());
        }
        if let Some(term) = self.terms.iter().find(|t| t.days == 0) {
            problems.push(format!("term {} must last at least one day", term.label));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(RiskError::configuration(problems.join("; ")))
        }
    }
}

/// Simulated tail of one asset over one term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermRisk {
    /// The term simulated.
    pub term: RiskTerm,
    /// Annualized volatility the term was simulated with.
    pub volatility: f64,
    /// Parametric one-day VaR at `volatility`.
    pub parametric: VaRResult,
    /// Terminal price at the lower `100 - p` percentile.
    pub var_price: f64,
    /// Fractional fall from spot to `var_price`; 0 for a zero spot.
    pub drawdown: f64,
}

/// Term risk of one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRisk {
    /// Asset symbol.
    pub symbol: AssetSymbol,
    /// Spot price.
    pub spot: f64,
    /// Annualized volatility.
    pub volatility: f64,
    /// Parametric one-day VaR at the annual volatility, as a return fraction.
    pub parametric: VaRResult,
    /// One entry per configured term, in order.
    pub terms: Vec<TermRisk>,
}

/// Output of [`asset_term_risk`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRiskReport {
    /// Seed the run used.
    pub seed: u64,
    /// Confidence level in percent.
    pub confidence_pct: f64,
    /// Per-asset results in market order.
    pub assets: Vec<AssetRisk>,
}

/// Parametric one-day VaR of a return with annual volatility `volatility`.
pub fn parametric_daily_var(volatility: f64, confidence_pct: f64) -> RiskResult<VaRResult> {
    if !(confidence_pct > 0.0 && confidence_pct < 100.0) {
        return Err(RiskError::InvalidInput(format!(
            "confidence must be within (0, 100) percent, got {confidence_pct}"
        )));
    }
    let normal = Normal::new(0.0, 1.0).map_err(|e| RiskError::InvalidInput(e.to_string()))?;
    let z = normal.inverse_cdf(confidence_pct / 100.0);

    Ok(VaRResult {
        var: z * volatility / 365.0_f64.sqrt(),
        confidence_pct,
        horizon_days: 1,
        method: VaRMethod::Parametric,
    })
}

/// Simulates every asset of `market` independently over each configured
/// term.
pub fn asset_term_risk(market: &MarketModel, config: &AssetRiskConfig) -> RiskResult<AssetRiskReport> {
    config.validate()?;
    let seed = config.seed.unwrap_or_else(rand::random);
    let tail_pct = 100.0 - config.var_percentile;

    tracing::info!(
        assets = market.len(),
        terms = config.terms.len(),
        scenarios = config.scenarios,
        seed,
        "starting asset term risk"
    );

    let jobs: Vec<(usize, usize)> = (0..market.len())
        .flat_map(|a| (0..config.terms.len()).map(move |t| (a, t)))
        .collect();
    // Jobs are few and heavy; parallelize whenever there is more than one.
    let parallel = RevaluationConfig::new()
        .with_parallel(config.parallel)
        .with_threshold(2);

    let results = maybe_parallel_map(&jobs, &parallel, |&(a, t)| {
        let term = &config.terms[t];
        let mut asset = market.assets()[a].clone();
        if let Some(vol) = market.term_volatility(&asset.symbol, term.days) {
            asset.volatility = vol;
        }
        simulate_term(&asset, term, config, block_seed(seed, a * config.terms.len() + t), tail_pct)
    });
    let mut results = results.into_iter();

    let mut assets = Vec::with_capacity(market.len());
    for asset in market.assets() {
        let terms = results
            .by_ref()
            .take(config.terms.len())
            .collect::<RiskResult<Vec<_>>>()?;
        assets.push(AssetRisk {
            symbol: asset.symbol.clone(),
            spot: asset.spot,
            volatility: asset.volatility,
            parametric: parametric_daily_var(asset.volatility, config.var_percentile)?,
            terms,
        });
    }

    tracing::info!(assets = assets.len(), "asset term risk finished");

    Ok(AssetRiskReport {
        seed,
        confidence_pct: config.var_percentile,
        assets,
    })
}

fn simulate_term(
    asset: &Asset,
    term: &RiskTerm,
    config: &AssetRiskConfig,
    seed: u64,
    tail_pct: f64,
) -> RiskResult<TermRisk> {
    let market = MarketModel::uncorrelated(vec![asset.clone()])?;
    let sim = SimulationConfig::new()
        .with_scenarios(config.scenarios)
        .with_horizon_years(term.horizon_years())
        .with_steps(term.days as usize)
        .with_parallel(false);

    let generator = CorrelatedPathGenerator::new(&market, &sim)?;
    let prices = generator.terminal_prices(config.scenarios, seed)?;
    let terminal: Vec<f64> = prices.column(0).to_vec();
    let var_price = percentile(&terminal, tail_pct)?;

    let drawdown = if asset.spot > 0.0 {
        1.0 - var_price / asset.spot
    } else {
        0.0
    };

    tracing::debug!(
        symbol = %asset.symbol,
        term = %term.label,
        volatility = asset.volatility,
        var_price,
        "simulated term"
    );

    Ok(TermRisk {
        term: term.clone(),
        volatility: asset.volatility,
        parametric: parametric_daily_var(asset.volatility, config.var_percentile)?,
        var_price,
        drawdown,
    })
}
