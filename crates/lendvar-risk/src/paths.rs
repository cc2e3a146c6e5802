//! Correlated geometric Brownian motion paths.
//!
//! Each asset follows
//!
//! ```text
//! ln S(t + dt) = ln S(t) + (mu - sigma²/2)·dt + sigma·sqrt(dt)·w
//! ```
//!
//! where the vector `w` of one time step and one scenario is `L·z` for
//! independent standard normals `z` and the Cholesky factor `L` of the
//! correlation matrix.
//!
//! Scenarios are generated in fixed-size blocks, each drawing from its own
//! generator seeded from `(seed, block index)`. Blocks are independent, so
//! they can run on any number of threads and still produce the same numbers.
//! Within a block draws are consumed time step by time step, scenario by
//! scenario, asset by asset.

use lendvar_core::{DataQualityIssue, Diagnostics};
use lendvar_math::linear_algebra::{cholesky_with_jitter, CholeskyFactor, DEFAULT_CHOLESKY_JITTER};
use lendvar_math::MathError;
use lendvar_portfolio::{maybe_parallel_map, RevaluationConfig};
use ndarray::{s, Array2, Array3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::config::SimulationConfig;
use crate::error::{RiskError, RiskResult};
use crate::market::MarketModel;

/// SplitMix64 finalizer.
fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seed of the generator for scenario block `block`.
pub fn block_seed(seed: u64, block: usize) -> u64 {
    splitmix64(seed ^ splitmix64(block as u64))
}

#[derive(Debug, Clone, Copy)]
struct Block {
    index: usize,
    start: usize,
    len: usize,
}

fn blocks(scenarios: usize, block_size: usize) -> Vec<Block> {
    (0..scenarios.div_ceil(block_size))
        .map(|index| {
            let start = index * block_size;
            Block {
                index,
                start,
                len: block_size.min(scenarios - start),
            }
        })
        .collect()
}

/// Generates correlated price scenarios for one market.
#[derive(Debug, Clone)]
pub struct CorrelatedPathGenerator {
    spots: Vec<f64>,
    /// `(mu - sigma²/2)·dt` per asset.
    step_drift: Vec<f64>,
    /// `sigma·sqrt(dt)` per asset.
    step_vol: Vec<f64>,
    factor: CholeskyFactor,
    steps: usize,
    block_size: usize,
    parallel: RevaluationConfig,
    diagnostics: Diagnostics,
}

impl CorrelatedPathGenerator {
    /// Prepares a generator for `market` under `config`.
    ///
    /// Factors the correlation matrix, retrying once with a regularized
    /// diagonal. A matrix that stays indefinite is a configuration error.
    pub fn new(market: &MarketModel, config: &SimulationConfig) -> RiskResult<Self> {
        config.validate()?;

        let factor = cholesky_with_jitter(market.correlation(), DEFAULT_CHOLESKY_JITTER).map_err(
            |err| match err {
                MathError::NotPositiveDefinite { .. } => RiskError::configuration(format!(
                    "correlation matrix is not positive-definite, even after adding \
                     {DEFAULT_CHOLESKY_JITTER:e} to the diagonal"
                )),
                other => RiskError::Math(other),
            },
        )?;

        let mut diagnostics = Diagnostics::new();
        if let Some(jitter) = factor.jitter() {
            diagnostics.record(DataQualityIssue::CorrelationRegularized { jitter });
        }
        for symbol in config.drift.keys() {
            if market.index_of(symbol).is_none() {
                diagnostics.record(DataQualityIssue::UnusedMarketEntry {
                    symbol: symbol.clone(),
                });
            }
        }

        let steps = config.effective_steps();
        let dt = config.dt();
        let assets = market.assets();
        let spots = assets.iter().map(|a| a.spot).collect();
        let step_drift = assets
            .iter()
            .map(|a| (config.drift_for(&a.symbol) - 0.5 * a.volatility * a.volatility) * dt)
            .collect();
        let step_vol = assets.iter().map(|a| a.volatility * dt.sqrt()).collect();

        tracing::debug!(
            assets = assets.len(),
            steps,
            dt,
            regularized = factor.was_regularized(),
            "factored correlation matrix"
        );

        Ok(Self {
            spots,
            step_drift,
            step_vol,
            factor,
            steps,
            block_size: config.scenario_block_size,
            parallel: config.revaluation_config(),
            diagnostics,
        })
    }

    /// Number of assets per scenario.
    pub fn dim(&self) -> usize {
        self.spots.len()
    }

    /// Time steps per path.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// The Cholesky factor in use.
    pub fn factor(&self) -> &CholeskyFactor {
        &self.factor
    }

    /// Regularization and unused drift entries found during setup.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Runs one block, calling `visit(step, scenario_in_block, log_sums)`
    /// after every step with the cumulative log returns of that scenario.
    fn walk_block<F>(&self, seed: u64, block: Block, mut visit: F)
    where
        F: FnMut(usize, usize, &[f64]),
    {
        let m = self.dim();
        let mut rng = StdRng::seed_from_u64(block_seed(seed, block.index));
        let mut log_sums = vec![0.0; block.len * m];
        let mut z = vec![0.0; m];
        let mut w = vec![0.0; m];

        for step in 0..self.steps {
            for (scenario, sums) in log_sums.chunks_exact_mut(m).enumerate() {
                for draw in &mut z {
                    *draw = rng.sample(StandardNormal);
                }
                self.factor.correlate(&z, &mut w);
                for j in 0..m {
                    sums[j] += self.step_drift[j] + self.step_vol[j] * w[j];
                }
                visit(step, scenario, sums);
            }
        }
    }

    fn terminal_block(&self, seed: u64, block: Block) -> Vec<f64> {
        let m = self.dim();
        let mut out = vec![0.0; block.len * m];
        let last = self.steps - 1;
        self.walk_block(seed, block, |step, scenario, sums| {
            if step == last {
                let row = &mut out[scenario * m..(scenario + 1) * m];
                for (j, price) in row.iter_mut().enumerate() {
                    *price = self.spots[j] * sums[j].exp();
                }
            }
        });
        out
    }

    fn path_block(&self, seed: u64, block: Block) -> Array3<f64> {
        let m = self.dim();
        let mut out = Array3::zeros((self.steps + 1, block.len, m));
        for scenario in 0..block.len {
            for j in 0..m {
                out[[0, scenario, j]] = self.spots[j];
            }
        }
        self.walk_block(seed, block, |step, scenario, sums| {
            for j in 0..m {
                out[[step + 1, scenario, j]] = self.spots[j] * sums[j].exp();
            }
        });
        out
    }

    /// Terminal prices, `[scenario x asset]`.
    ///
    /// Equal to the last time slice of [`full_paths`](Self::full_paths)
    /// for the same seed.
    pub fn terminal_prices(&self, scenarios: usize, seed: u64) -> RiskResult<Array2<f64>> {
        if scenarios == 0 {
            return Err(RiskError::configuration("scenarios must be at least 1"));
        }

        let m = self.dim();
        let blocks = blocks(scenarios, self.block_size);
        let chunks = maybe_parallel_map(&blocks, &self.parallel, |&block| {
            self.terminal_block(seed, block)
        });

        let flat: Vec<f64> = chunks.into_iter().flatten().collect();
        Array2::from_shape_vec((scenarios, m), flat)
            .map_err(|err| RiskError::input_shape(format!("terminal price matrix: {err}")))
    }

    /// Full price paths, `[time x scenario x asset]`; time 0 holds spot.
    pub fn full_paths(&self, scenarios: usize, seed: u64) -> RiskResult<Array3<f64>> {
        if scenarios == 0 {
            return Err(RiskError::configuration("scenarios must be at least 1"));
        }

        let m = self.dim();
        let blocks = blocks(scenarios, self.block_size);
        let parts = maybe_parallel_map(&blocks, &self.parallel, |&block| {
            self.path_block(seed, block)
        });

        let mut paths = Array3::zeros((self.steps + 1, scenarios, m));
        for (block, part) in blocks.iter().zip(parts) {
            paths
                .slice_mut(s![.., block.start..block.start + block.len, ..])
                .assign(&part);
        }
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PathScheme;
    use crate::market::Asset;
    use approx::assert_relative_eq;
    use lendvar_core::AssetSymbol;
    use nalgebra::DMatrix;
    use std::collections::BTreeMap;

    fn asset(symbol: &str, spot: f64, volatility: f64) -> Asset {
        Asset {
            symbol: AssetSymbol::new(symbol).unwrap(),
            spot,
            volatility,
        }
    }

    fn small_config() -> SimulationConfig {
        SimulationConfig::new()
            .with_scenarios(300)
            .with_steps(12)
            .with_horizon_years(1.0)
            .with_block_size(64)
    }

    #[test]
    fn test_blocks_cover_scenarios() {
        let b = blocks(300, 128);
        assert_eq!(b.len(), 3);
        assert_eq!(b[2].start, 256);
        assert_eq!(b[2].len, 44);
        assert_eq!(b.iter().map(|x| x.len).sum::<usize>(), 300);
    }

    #[test]
    fn test_block_seeds_differ() {
        assert_ne!(block_seed(7, 0), block_seed(7, 1));
        assert_ne!(block_seed(7, 0), block_seed(8, 0));
        assert_eq!(block_seed(7, 3), block_seed(7, 3));
    }

    #[test]
    fn test_terminal_matches_last_path_slice() {
        let market = MarketModel::new(
            vec![AssetSymbol::new("A").unwrap(), AssetSymbol::new("B").unwrap()],
            &[(AssetSymbol::new("A").unwrap(), 100.0), (AssetSymbol::new("B").unwrap(), 1.0)]
                .into_iter()
                .collect(),
            &[(AssetSymbol::new("A").unwrap(), 0.8), (AssetSymbol::new("B").unwrap(), 0.05)]
                .into_iter()
                .collect(),
            DMatrix::from_row_slice(2, 2, &[1.0, 0.6, 0.6, 1.0]),
        )
        .unwrap();
        let generator = CorrelatedPathGenerator::new(&market, &small_config()).unwrap();

        let paths = generator.full_paths(300, 11).unwrap();
        let terminal = generator.terminal_prices(300, 11).unwrap();

        assert_eq!(paths.shape(), &[13, 300, 2]);
        assert_eq!(terminal.shape(), &[300, 2]);
        assert_eq!(paths.slice(s![12, .., ..]), terminal);
        assert_eq!(paths[[0, 17, 0]], 100.0);
        assert_eq!(paths[[0, 17, 1]], 1.0);
    }

    #[test]
    fn test_zero_volatility_is_deterministic() {
        let market = MarketModel::uncorrelated(vec![asset("A", 50.0, 0.0)]).unwrap();
        let config = small_config().with_drift(AssetSymbol::new("A").unwrap(), 0.1);
        let generator = CorrelatedPathGenerator::new(&market, &config).unwrap();

        let terminal = generator.terminal_prices(10, 3).unwrap();
        let expected = 50.0 * (0.1_f64).exp();
        for price in terminal.iter() {
            assert_relative_eq!(*price, expected, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_zero_spot_stays_zero() {
        let market =
            MarketModel::uncorrelated(vec![asset("DEAD", 0.0, 0.9), asset("A", 1.0, 0.5)]).unwrap();
        let generator = CorrelatedPathGenerator::new(&market, &small_config()).unwrap();
        let paths = generator.full_paths(20, 5).unwrap();
        assert!(paths.slice(s![.., .., 0]).iter().all(|&p| p == 0.0));
        assert!(paths.slice(s![1.., .., 1]).iter().all(|&p| p > 0.0));
    }

    #[test]
    fn test_block_size_changes_draws_but_not_shape() {
        let market = MarketModel::uncorrelated(vec![asset("A", 1.0, 0.5)]).unwrap();
        let a = CorrelatedPathGenerator::new(&market, &small_config().with_block_size(64))
            .unwrap()
            .terminal_prices(100, 1)
            .unwrap();
        let b = CorrelatedPathGenerator::new(&market, &small_config().with_block_size(64))
            .unwrap()
            .terminal_prices(100, 1)
            .unwrap();
        assert_eq!(a, b);

        let c = CorrelatedPathGenerator::new(&market, &small_config().with_block_size(10))
            .unwrap()
            .terminal_prices(100, 1)
            .unwrap();
        // Block layout decides which draws a scenario consumes.
        assert_eq!(c.shape(), a.shape());
        assert_ne!(a, c);
    }

    #[test]
    fn test_closed_form_takes_one_step() {
        let market = MarketModel::uncorrelated(vec![asset("A", 1.0, 0.5)]).unwrap();
        let config = small_config().with_scheme(PathScheme::ClosedForm);
        let generator = CorrelatedPathGenerator::new(&market, &config).unwrap();
        assert_eq!(generator.steps(), 1);
        assert_eq!(generator.full_paths(4, 0).unwrap().shape(), &[2, 4, 1]);
    }

    #[test]
    fn test_regularized_matrix_flagged() {
        let ones = DMatrix::from_element(2, 2, 1.0);
        let symbols = vec![AssetSymbol::new("X").unwrap(), AssetSymbol::new("Y").unwrap()];
        let market = MarketModel::new(symbols, &BTreeMap::new(), &BTreeMap::new(), ones).unwrap();

        let generator = CorrelatedPathGenerator::new(&market, &small_config()).unwrap();
        assert!(generator.factor().was_regularized());
        assert!(generator.diagnostics().contains_kind("correlation_regularized"));
    }

    #[test]
    fn test_indefinite_matrix_is_configuration_error() {
        let corr = DMatrix::from_row_slice(
            3,
            3,
            &[1.0, 0.95, -0.95, 0.95, 1.0, 0.95, -0.95, 0.95, 1.0],
        );
        let symbols = ["P", "Q", "R"].map(|s| AssetSymbol::new(s).unwrap()).to_vec();
        let market = MarketModel::new(symbols, &BTreeMap::new(), &BTreeMap::new(), corr).unwrap();

        let err = CorrelatedPathGenerator::new(&market, &small_config()).unwrap_err();
        assert!(matches!(err, RiskError::Configuration { .. }));
    }

    #[test]
    fn test_unknown_drift_symbol_reported() {
        let market = MarketModel::uncorrelated(vec![asset("A", 1.0, 0.5)]).unwrap();
        let config = small_config().with_drift(AssetSymbol::new("ZZZ").unwrap(), 0.02);
        let generator = CorrelatedPathGenerator::new(&market, &config).unwrap();
        assert!(generator.diagnostics().contains_kind("unused_market_entry"));
    }
}
