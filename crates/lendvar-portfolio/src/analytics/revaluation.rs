//! Scenario revaluation.
//!
//! Under a price scenario each account is valued independently; an account
//! whose debt value exceeds its collateral value contributes the difference
//! to the protocol shortfall, and a solvent account contributes nothing.
//! Surplus is never netted across accounts.
//!
//! Two entry points compute the same number:
//!
//! - [`scenario_shortfall`] takes any [`PriceSource`] keyed by symbol and
//!   reports which symbols fell back to recorded prices.
//! - [`RevaluationPlan`] resolves every position to a column of the scenario
//!   matrix once, then revalues scenario rows by index. The engine uses it
//!   for the tens of thousands of scenarios of a run.

use std::collections::{BTreeMap, HashMap};

use lendvar_core::{AssetSymbol, DataQualityIssue, Diagnostics};
use serde::{Deserialize, Serialize};

use super::parallel::maybe_parallel_rows_map;
use crate::portfolio::Portfolio;
use crate::types::{PriceSource, RevaluationConfig};

/// Protocol-wide outcome of one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioShortfall {
    /// Sum of account shortfalls.
    pub shortfall: f64,
    /// Number of accounts with negative net value.
    pub insolvent_accounts: usize,
    /// Symbols the scenario did not price, with the number of positions
    /// valued at their recorded price instead.
    pub fallbacks: BTreeMap<AssetSymbol, usize>,
}

impl ScenarioShortfall {
    /// Converts the fallbacks into data-quality diagnostics (logging each).
    pub fn diagnostics(&self) -> Diagnostics {
        fallback_diagnostics(&self.fallbacks)
    }
}

/// One [`DataQualityIssue::ScenarioPriceFallback`] per symbol, in symbol order.
pub(crate) fn fallback_diagnostics(fallbacks: &BTreeMap<AssetSymbol, usize>) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    for (symbol, &positions) in fallbacks {
        diagnostics.record(DataQualityIssue::ScenarioPriceFallback {
            symbol: symbol.clone(),
            positions,
        });
    }
    diagnostics
}

/// Revalues every account of `portfolio` under `prices`.
pub fn scenario_shortfall<P: PriceSource + ?Sized>(
    portfolio: &Portfolio,
    prices: &P,
) -> ScenarioShortfall {
    let mut fallbacks: BTreeMap<AssetSymbol, usize> = BTreeMap::new();
    let mut shortfall = 0.0;
    let mut insolvent_accounts = 0;

    for account in portfolio.accounts() {
        let valuation = account.valuation_with(|position| {
            prices.price(&position.symbol).unwrap_or_else(|| {
                *fallbacks.entry(position.symbol.clone()).or_default() += 1;
                position.reference_price
            })
        });
        if valuation.is_insolvent() {
            insolvent_accounts += 1;
            shortfall += valuation.shortfall();
        }
    }

    ScenarioShortfall {
        shortfall,
        insolvent_accounts,
        fallbacks,
    }
}

#[derive(Debug, Clone, Copy)]
enum PriceRef {
    Column(usize),
    Fixed(f64),
}

#[derive(Debug, Clone, Copy)]
struct ResolvedPosition {
    price: PriceRef,
    collateral_amount: f64,
    debt_amount: f64,
    is_collateral: bool,
}

/// A portfolio compiled against a fixed scenario column layout.
#[derive(Debug, Clone)]
pub struct RevaluationPlan {
    width: usize,
    positions: Vec<ResolvedPosition>,
    /// Exclusive end offset into `positions` for each account.
    account_ends: Vec<usize>,
    diagnostics: Diagnostics,
}

impl RevaluationPlan {
    /// Resolves each position of `portfolio` to the column of its symbol in
    /// `columns`, or to its recorded price when the symbol has no column.
    ///
    /// Each symbol without a column is recorded once as a
    /// [`DataQualityIssue::ScenarioPriceFallback`].
    pub fn compile(portfolio: &Portfolio, columns: &[AssetSymbol]) -> Self {
        let mut index: HashMap<&AssetSymbol, usize> = HashMap::with_capacity(columns.len());
        for (i, symbol) in columns.iter().enumerate() {
            index.entry(symbol).or_insert(i);
        }

        let mut positions = Vec::with_capacity(portfolio.position_count());
        let mut account_ends = Vec::with_capacity(portfolio.len());
        let mut missing: BTreeMap<AssetSymbol, usize> = BTreeMap::new();

        for account in portfolio.accounts() {
            for position in account.positions() {
                let price = match index.get(&position.symbol) {
                    Some(&column) => PriceRef::Column(column),
                    None => {
                        *missing.entry(position.symbol.clone()).or_default() += 1;
                        PriceRef::Fixed(position.reference_price)
                    }
                };
                positions.push(ResolvedPosition {
                    price,
                    collateral_amount: position.collateral_amount,
                    debt_amount: position.debt_amount,
                    is_collateral: position.is_collateral,
                });
            }
            account_ends.push(positions.len());
        }

        let mut diagnostics = Diagnostics::new();
        for (symbol, count) in missing {
            diagnostics.record(DataQualityIssue::ScenarioPriceFallback {
                symbol,
                positions: count,
            });
        }

        tracing::debug!(
            accounts = account_ends.len(),
            positions = positions.len(),
            columns = columns.len(),
            "compiled revaluation plan"
        );

        Self {
            width: columns.len(),
            positions,
            account_ends,
            diagnostics,
        }
    }

    /// Number of scenario columns the plan expects per row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of accounts in the plan.
    pub fn account_count(&self) -> usize {
        self.account_ends.len()
    }

    /// Fallbacks found while compiling.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Protocol shortfall for one scenario row.
    ///
    /// # Panics
    ///
    /// Panics if `prices` is shorter than [`width`](Self::width).
    pub fn shortfall(&self, prices: &[f64]) -> f64 {
        assert!(prices.len() >= self.width, "scenario row too short");

        let mut total = 0.0;
        let mut start = 0;
        for &end in &self.account_ends {
            let mut collateral = 0.0;
            let mut debt = 0.0;
            for position in &self.positions[start..end] {
                let price = match position.price {
                    PriceRef::Column(i) => prices[i],
                    PriceRef::Fixed(p) => p,
                };
                collateral += if position.is_collateral {
                    position.collateral_amount * price
                } else {
                    0.0
                };
                debt += position.debt_amount * price;
            }
            let net = collateral - debt;
            if net < 0.0 {
                total += -net;
            }
            start = end;
        }
        total
    }

    /// Shortfall of every row of a row-major `[scenarios x width]` matrix,
    /// in row order.
    ///
    /// # Panics
    ///
    /// Panics if the plan has zero width.
    pub fn shortfalls(&self, matrix: &[f64], config: &RevaluationConfig) -> Vec<f64> {
        maybe_parallel_rows_map(matrix, self.width, config, |row| self.shortfall(row))
    }
}
