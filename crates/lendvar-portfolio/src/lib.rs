//! # Lendvar Portfolio
//!
//! Borrower portfolio snapshot and its valuation under price scenarios.
//!
//! ## Design Philosophy
//!
//! - **Pure functions**: All calculations are stateless with explicit inputs
//! - **Read-only snapshot**: Accounts and positions never change during a run
//! - **Explicit fallbacks**: A symbol a scenario does not price is valued at
//!   its recorded price and reported as a diagnostic
//! - **Config-driven parallelism**: Optional rayon support with threshold-based switching
//!
//! ## Features
//!
//! - **Accounts**: Collateral value of pledged balances, debt value of all
//!   borrowed balances, net value and shortfall
//! - **Scenario Revaluation**: Protocol-wide shortfall without netting
//!   across accounts, through a symbol map or a compiled [`RevaluationPlan`]
//! - **Current Bad Debt**: Shortfall at one set of prices, attributed to debt
//!   assets pro-rata
//!
//! ## Quick Start
//!
//! ```rust
//! use lendvar_portfolio::prelude::*;
//! use lendvar_core::{AccountId, AssetSymbol};
//!
//! let weth = AssetSymbol::new("WETH").unwrap();
//! let usdc = AssetSymbol::new("USDC").unwrap();
//! let record = |symbol: &AssetSymbol, collateral: f64, debt: f64, price: f64| PositionRecord {
//!     account_id: AccountId::new("0xabc").unwrap(),
//!     symbol: symbol.clone(),
//!     collateral_amount: collateral,
//!     debt_amount: debt,
//!     is_collateral: true,
//!     reference_price: price,
//! };
//!
//! let portfolio = Portfolio::from_records(vec![
//!     record(&weth, 1.0, 0.0, 3000.0),
//!     record(&usdc, 0.0, 2500.0, 1.0),
//! ])
//! .unwrap();
//!
//! let plan = RevaluationPlan::compile(&portfolio, &[weth, usdc]);
//! assert_eq!(plan.shortfall(&[3000.0, 1.0]), 0.0);
//! assert_eq!(plan.shortfall(&[2000.0, 1.0]), 500.0);
//! ```
//!
//! ## Module Overview
//!
//! - [`analytics`] - Scenario revaluation, current bad debt, parallel helpers
//! - [`portfolio`] - The [`Portfolio`] snapshot
//! - [`types`] - Positions, accounts, price sources, configuration
//!
//! ## Feature Flags
//!
//! - `parallel`: Enable rayon-based parallel processing for large portfolios
//!   and scenario sets

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod analytics;
pub mod error;
pub mod portfolio;
pub mod types;

// Re-export error types at crate root
pub use error::{PortfolioError, PortfolioResult};

// Re-export main types
pub use types::{
    Account, AccountValuation, IndexedPrices, Position, PositionRecord, PriceSource,
    RevaluationConfig,
};

// Re-export portfolio types
pub use portfolio::Portfolio;

// Re-export analytics types and functions
pub use analytics::{
    // Snapshot
    current_bad_debt,
    // Parallel utilities
    maybe_parallel_map,
    maybe_parallel_rows_map,
    // Revaluation
    scenario_shortfall,
    BadDebtSnapshot,
    RevaluationPlan,
    ScenarioShortfall,
    SymbolBadDebt,
};

/// Prelude module for convenient imports.
///
/// ```rust
/// use lendvar_portfolio::prelude::*;
/// ```
pub mod prelude {
    pub use crate::analytics::{
        current_bad_debt, scenario_shortfall, BadDebtSnapshot, RevaluationPlan,
        ScenarioShortfall, SymbolBadDebt,
    };
    pub use crate::error::{PortfolioError, PortfolioResult};
    pub use crate::portfolio::Portfolio;
    pub use crate::types::{
        Account, AccountValuation, IndexedPrices, Position, PositionRecord, PriceSource,
        RevaluationConfig,
    };
}
