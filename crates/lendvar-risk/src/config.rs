//! Simulation configuration.

use std::collections::BTreeMap;

use lendvar_core::AssetSymbol;
use lendvar_portfolio::RevaluationConfig;
use serde::{Deserialize, Serialize};

use crate::error::{RiskError, RiskResult};

/// How terminal prices are sampled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathScheme {
    /// Step the log price through `steps` increments of `horizon / steps`.
    #[default]
    Discretized,
    /// Draw the terminal log return in one step of length `horizon`.
    ClosedForm,
}

impl std::fmt::Display for PathScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Discretized => write!(f, "discretized"),
            Self::ClosedForm => write!(f, "closed-form"),
        }
    }
}

/// Settings for one Monte Carlo bad-debt run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of independent scenarios.
    #[serde(default = "default_scenarios")]
    pub scenarios: usize,

    /// Simulation horizon in years.
    #[serde(default = "default_horizon_years")]
    pub horizon_years: f64,

    /// Time steps over the horizon (ignored by [`PathScheme::ClosedForm`]).
    #[serde(default = "default_steps")]
    pub steps: usize,

    /// VaR confidence level in percent.
    #[serde(default = "default_var_percentile")]
    pub var_percentile: f64,

    /// Random seed for reproducibility (None = random).
    #[serde(default)]
    pub seed: Option<u64>,

    /// Annualized drift per asset; assets not listed drift at 0.
    #[serde(default)]
    pub drift: BTreeMap<AssetSymbol, f64>,

    /// Terminal price sampling scheme.
    #[serde(default)]
    pub scheme: PathScheme,

    /// Scenarios per independently seeded block.
    #[serde(default = "default_block_size")]
    pub scenario_block_size: usize,

    /// Enable parallel processing.
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// Minimum item count to trigger parallel processing.
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

fn default_scenarios() -> usize {
    10_000
}

fn default_horizon_years() -> f64 {
    1.0
}

fn default_steps() -> usize {
    365
}

fn default_var_percentile() -> f64 {
    99.9
}

fn default_block_size() -> usize {
    256
}

fn default_parallel() -> bool {
    true
}

fn default_parallel_threshold() -> usize {
    64
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            scenarios: default_scenarios(),
            horizon_years: default_horizon_years(),
            steps: default_steps(),
            var_percentile: default_var_percentile(),
            seed: None,
            drift: BTreeMap::new(),
            scheme: PathScheme::default(),
            scenario_block_size: default_block_size(),
            parallel: default_parallel(),
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

impl SimulationConfig {
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

    /// Builder method to set the horizon in years.
    #[must_use]
    pub fn with_horizon_years(mut self, years: f64) -> Self {
        self.horizon_years = years;
        self
    }

    /// Builder method to set the number of time steps.
    #[must_use]
    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    /// Builder method to set the VaR confidence in percent.
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

    /// Builder method to set one asset's drift.
    #[must_use]
    pub fn with_drift(mut self, symbol: AssetSymbol, drift: f64) -> Self {
        self.drift.insert(symbol, drift);
        self
    }

    /// Builder method to set the path scheme.
    #[must_use]
    pub fn with_scheme(mut self, scheme: PathScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Builder method to set the scenario block size.
    #[must_use]
    pub fn with_block_size(mut self, size: usize) -> Self {
        self.scenario_block_size = size;
        self
    }

    /// Builder method to enable or disable parallel processing.
    #[must_use]
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Builder method to set the parallel threshold.
    #[must_use]
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Drift of `symbol`, 0 when not configured.
    pub fn drift_for(&self, symbol: &AssetSymbol) -> f64 {
        self.drift.get(symbol).copied().unwrap_or(0.0)
    }

    /// Time steps actually taken under the configured scheme.
    pub fn effective_steps(&self) -> usize {
        match self.scheme {
            PathScheme::Discretized => self.steps,
            PathScheme::ClosedForm => 1,
        }
    }

    /// Length of one time step in years.
    pub fn dt(&self) -> f64 {
        self.horizon_years / self.effective_steps() as f64
    }

    /// Horizon rounded to whole days.
    pub fn horizon_days(&self) -> u32 {
        (self.horizon_years * 365.0).round() as u32
    }

    /// Parallelism settings for revaluation and block generation.
    pub fn revaluation_config(&self) -> RevaluationConfig {
        RevaluationConfig::new()
            .with_parallel(self.parallel)
            .with_threshold(self.parallel_threshold)
    }

    /// Checks every setting, reporting all problems at once.
    pub fn validate(&self) -> RiskResult<()> {
        let mut problems = Vec::new();

        if self.scenarios == 0 {
            problems.push("scenarios must be at least 1".to_string());
        }
        if self.steps == 0 {
            problems.push("steps must be at least 1".to_string());
        }
        if !self.horizon_years.is_finite() || self.horizon_years <= 0.0 {
            problems.push(format!(
                "horizon must be a positive number of years, got {}",
                self.horizon_years
            ));
        }
        if !(0.0..=100.0).contains(&self.var_percentile) {
            problems.push(format!(
                "VaR percentile must be within [0, 100], got {}",
                self.var_percentile
            ));
        }
        if self.scenario_block_size == 0 {
            problems.push("scenario block size must be at least 1".to_string());
        }
        for (symbol, drift) in &self.drift {
            if !drift.is_finite() {
                problems.push(format!("drift for {symbol} must be finite, got {drift}"));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(RiskError::configuration(problems.join("; ")))
        }
    }
}
