//! # Lendvar Risk
//!
//! Monte Carlo Value at Risk of lending-protocol bad debt.
//!
//! ## Design Philosophy
//!
//! - **Reproducible**: a seed fixes every draw, independent of thread count
//! - **Fail early**: configuration and shape errors surface before any draw
//! - **Degrade visibly**: recoverable data problems become [`Diagnostics`]
//!   entries on the report instead of silent defaults
//!
//! ## Pipeline
//!
//! 1. [`MarketModel`]: spot prices, volatilities and a validated correlation
//!    matrix in a fixed asset order
//! 2. [`CorrelatedPathGenerator`]: correlated geometric Brownian motion,
//!    generated in independently seeded scenario blocks
//! 3. [`RevaluationPlan`](lendvar_portfolio::RevaluationPlan): per-scenario
//!    protocol shortfall, summing each account's uncovered debt
//! 4. [`ShortfallDistribution`]: VaR, mean, max and histogram
//!
//! [`BadDebtSimulator`] runs all four steps.
//!
//! ## Quick Start
//!
//! ```rust
//! use lendvar_core::{AccountId, AssetSymbol};
//! use lendvar_portfolio::{Portfolio, PositionRecord};
//! use lendvar_risk::prelude::*;
//!
//! let weth = AssetSymbol::new("WETH").unwrap();
//! let market = MarketModel::uncorrelated(vec![Asset {
//!     symbol: weth.clone(),
//!     spot: 3000.0,
//!     volatility: 0.7,
//! }])
//! .unwrap();
//!
//! let portfolio = Portfolio::from_records(vec![PositionRecord {
//!     account_id: AccountId::new("0xabc").unwrap(),
//!     symbol: weth,
//!     collateral_amount: 1.0,
//!     debt_amount: 0.8,
//!     is_collateral: true,
//!     reference_price: 3000.0,
//! }])
//! .unwrap();
//!
//! let config = SimulationConfig::new().with_scenarios(1000).with_steps(30).with_seed(7);
//! let report = BadDebtSimulator::new(&market, &portfolio, config).run().unwrap();
//! assert!(report.summary.max >= report.summary.mean);
//! ```
//!
//! ## Module Overview
//!
//! - [`market`]: market parameters and the validated market model
//! - [`paths`]: correlated path generation
//! - [`distribution`]: shortfall distribution and tail statistics
//! - [`engine`]: the end-to-end simulator
//! - [`calibration`]: market parameters from daily price history
//! - [`asset_risk`]: single-asset terminal price tails per term

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]

pub mod asset_risk;
pub mod calibration;
pub mod config;
pub mod distribution;
pub mod engine;
pub mod error;
pub mod market;
pub mod paths;

pub use lendvar_core::Diagnostics;

pub use asset_risk::{asset_term_risk, AssetRisk, AssetRiskConfig, AssetRiskReport, RiskTerm, TermRisk};
pub use calibration::{calibrate, CalibrationConfig, PriceHistory};
pub use config::{PathScheme, SimulationConfig};
pub use distribution::{Histogram, ShortfallDistribution, TailRiskSummary, VaRMethod, VaRResult};
pub use engine::{BadDebtSimulator, SimulationReport};
pub use error::{RiskError, RiskResult};
pub use market::{Asset, MarketModel, MarketParameters, WindowVolatility};
pub use paths::CorrelatedPathGenerator;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::asset_risk::{asset_term_risk, AssetRiskConfig, RiskTerm};
    pub use crate::calibration::{calibrate, CalibrationConfig, PriceHistory};
    pub use crate::config::{PathScheme, SimulationConfig};
    pub use crate::distribution::{ShortfallDistribution, TailRiskSummary, VaRResult};
    pub use crate::engine::{BadDebtSimulator, SimulationReport};
    pub use crate::error::{RiskError, RiskResult};
    pub use crate::market::{Asset, MarketModel, MarketParameters, WindowVolatility};
    pub use crate::paths::CorrelatedPathGenerator;
}
