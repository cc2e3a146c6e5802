//! Monte Carlo bad-debt engine.
//!
//! Ties the pipeline together: market model, correlated terminal prices,
//! revaluation of every account under every scenario, and the tail
//! statistics of the resulting shortfall distribution.

use lendvar_core::Diagnostics;
use lendvar_portfolio::{Portfolio, RevaluationPlan};
use serde::{Deserialize, Serialize};

use crate::config::{PathScheme, SimulationConfig};
use crate::distribution::{
    Histogram, ShortfallDistribution, TailRiskSummary, VaRMethod, VaRResult,
};
use crate::error::{RiskError, RiskResult};
use crate::market::MarketModel;
use crate::paths::CorrelatedPathGenerator;

/// Everything a simulation run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Seed the run used; pass it back in to replay the run.
    pub seed: u64,
    /// Terminal price sampling scheme.
    pub scheme: PathScheme,
    /// Horizon in years.
    pub horizon_years: f64,
    /// Number of accounts revalued per scenario.
    pub accounts: usize,
    /// VaR, mean and max shortfall.
    pub summary: TailRiskSummary,
    /// Shortfall of every scenario.
    pub distribution: ShortfallDistribution,
    /// Data-quality issues met during the run.
    pub diagnostics: Diagnostics,
}

impl SimulationReport {
    /// The VaR of the run tagged with its horizon.
    pub fn var_result(&self) -> VaRResult {
        VaRResult {
            var: self.summary.var,
            confidence_pct: self.summary.confidence_pct,
            horizon_days: (self.horizon_years * 365.0).round() as u32,
            method: VaRMethod::MonteCarlo,
        }
    }

    /// Histogram of the shortfall distribution.
    pub fn histogram(&self, bins: usize) -> RiskResult<Histogram> {
        self.distribution.histogram(bins)
    }
}

/// Monte Carlo simulator of protocol bad debt.
#[derive(Debug, Clone)]
pub struct BadDebtSimulator<'a> {
    market: &'a MarketModel,
    portfolio: &'a Portfolio,
    config: SimulationConfig,
}

impl<'a> BadDebtSimulator<'a> {
    /// Creates a simulator over a fixed market and portfolio.
    pub fn new(market: &'a MarketModel, portfolio: &'a Portfolio, config: SimulationConfig) -> Self {
        Self {
            market,
            portfolio,
            config,
        }
    }

    /// The run configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Runs the simulation.
    ///
    /// Configuration and shape errors surface before any random draw. With
    /// no configured seed one is drawn from OS entropy and reported in the
    /// result.
    pub fn run(&self) -> RiskResult<SimulationReport> {
        let config = &self.config;
        config.validate()?;

        let generator = CorrelatedPathGenerator::new(self.market, config)?;
        let columns = self.market.symbols();
        let plan = RevaluationPlan::compile(self.portfolio, &columns);
        let seed = config.seed.unwrap_or_else(rand::random);

        tracing::info!(
            scenarios = config.scenarios,
            assets = self.market.len(),
            accounts = self.portfolio.len(),
            seed,
            scheme = %config.scheme,
            "starting bad-debt simulation"
        );

        let prices = generator.terminal_prices(config.scenarios, seed)?;
        tracing::debug!(
            scenarios = config.scenarios,
            steps = generator.steps(),
            "generated terminal prices"
        );

        let prices = prices.as_standard_layout();
        let rows = prices
            .as_slice()
            .ok_or_else(|| RiskError::input_shape("terminal prices are not contiguous"))?;
        let shortfalls = plan.shortfalls(rows, &config.revaluation_config());
        tracing::debug!(
            positions = self.portfolio.position_count(),
            "revalued portfolio"
        );

        let distribution = ShortfallDistribution::new(shortfalls)?;
        let summary = distribution.summary(config.var_percentile)?;

        let mut diagnostics = self.market.diagnostics().clone();
        diagnostics.extend(generator.diagnostics().clone());
        diagnostics.extend(plan.diagnostics().clone());

        tracing::info!(
            var = summary.var,
            confidence = summary.confidence_pct,
            mean = summary.mean,
            max = summary.max,
            diagnostics = diagnostics.len(),
            "bad-debt simulation finished"
        );

        Ok(SimulationReport {
            seed,
            scheme: config.scheme,
            horizon_years: config.horizon_years,
            accounts: plan.account_count(),
            summary,
            distribution,
            diagnostics,
        })
    }
}
