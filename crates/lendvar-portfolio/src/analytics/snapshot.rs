//! Current bad debt at a single set of prices.
//!
//! Each insolvent account's shortfall is attributed to the assets it owes,
//! pro-rata by the value of each debt.

use std::collections::BTreeMap;

use lendvar_core::{AssetSymbol, Diagnostics};
use serde::{Deserialize, Serialize};

use super::parallel::maybe_parallel_map;
use super::revaluation::fallback_diagnostics;
use crate::portfolio::Portfolio;
use crate::types::{Account, AccountValuation, PriceSource, RevaluationConfig};

/// Bad debt attributed to one debt asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolBadDebt {
    /// Share of insolvent accounts' shortfall owed in this asset.
    pub bad_debt: f64,
    /// Insolvent accounts owing this asset.
    pub accounts: usize,
}

/// Protocol bad debt at one set of prices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BadDebtSnapshot {
    /// Sum of account shortfalls.
    pub total_bad_debt: f64,
    /// Pledged collateral value across all accounts.
    pub total_collateral_value: f64,
    /// Debt value across all accounts.
    pub total_debt_value: f64,
    /// Accounts evaluated.
    pub accounts: usize,
    /// Accounts with positive debt value.
    pub active_accounts: usize,
    /// Accounts with debt value above collateral value.
    pub insolvent_accounts: usize,
    /// Attribution of `total_bad_debt` by debt asset.
    pub by_symbol: BTreeMap<AssetSymbol, SymbolBadDebt>,
    /// One price fallback per symbol `prices` did not quote.
    pub diagnostics: Diagnostics,
}

struct AccountBadDebt {
    valuation: AccountValuation,
    debt_by_symbol: BTreeMap<AssetSymbol, f64>,
    fallbacks: BTreeMap<AssetSymbol, usize>,
}

fn evaluate<P: PriceSource + ?Sized>(account: &Account, prices: &P) -> AccountBadDebt {
    let mut debt_by_symbol: BTreeMap<AssetSymbol, f64> = BTreeMap::new();
    let mut fallbacks: BTreeMap<AssetSymbol, usize> = BTreeMap::new();
    let valuation = account.valuation_with(|position| {
        let price = prices.price(&position.symbol).unwrap_or_else(|| {
            *fallbacks.entry(position.symbol.clone()).or_default() += 1;
            position.reference_price
        });
        let debt = position.debt_value(price);
        if debt > 0.0 {
            *debt_by_symbol.entry(position.symbol.clone()).or_default() += debt;
        }
        price
    });
    AccountBadDebt {
        valuation,
        debt_by_symbol,
        fallbacks,
    }
}

/// Computes protocol bad debt under `prices`, falling back to each
/// position's recorded price for symbols `prices` does not quote.
///
/// Every fallback symbol is reported in [`BadDebtSnapshot::diagnostics`].
pub fn current_bad_debt<P>(
    portfolio: &Portfolio,
    prices: &P,
    config: &RevaluationConfig,
) -> BadDebtSnapshot
where
    P: PriceSource + Sync + ?Sized,
{
    let evaluated = maybe_parallel_map(portfolio.accounts(), config, |account| {
        evaluate(account, prices)
    });

    let mut snapshot = BadDebtSnapshot {
        accounts: evaluated.len(),
        ..BadDebtSnapshot::default()
    };

    let mut fallbacks: BTreeMap<AssetSymbol, usize> = BTreeMap::new();
    for account in evaluated {
        for (symbol, positions) in account.fallbacks {
            *fallbacks.entry(symbol).or_default() += positions;
        }

        let valuation = account.valuation;
        snapshot.total_collateral_value += valuation.collateral_value;
        snapshot.total_debt_value += valuation.debt_value;
        if valuation.debt_value > 0.0 {
            snapshot.active_accounts += 1;
        }
        if !valuation.is_insolvent() {
            continue;
        }

        let shortfall = valuation.shortfall();
        snapshot.insolvent_accounts += 1;
        snapshot.total_bad_debt += shortfall;

        for (symbol, debt) in account.debt_by_symbol {
            let entry = snapshot.by_symbol.entry(symbol).or_default();
            entry.bad_debt += shortfall * debt / valuation.debt_value;
            entry.accounts += 1;
        }
    }

    snapshot.diagnostics = fallback_diagnostics(&fallbacks);

    tracing::debug!(
        accounts = snapshot.accounts,
        insolvent = snapshot.insolvent_accounts,
        bad_debt = snapshot.total_bad_debt,
        "computed current bad debt"
    );

    snapshot
}
