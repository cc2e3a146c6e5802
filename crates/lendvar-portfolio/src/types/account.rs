//! Borrower accounts and their valuation.

use lendvar_core::AccountId;
use serde::{Deserialize, Serialize};

use super::{Position, PriceSource};

/// A borrower account: every position held under one account id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    positions: Vec<Position>,
}

/// Collateral and debt value of one account under one set of prices.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AccountValuation {
    /// Value of pledged balances.
    pub collateral_value: f64,
    /// Value of all borrowed balances.
    pub debt_value: f64,
    /// Positions valued at their recorded price because the price source
    /// did not quote their symbol.
    #[serde(default)]
    pub fallback_positions: usize,
}

impl AccountValuation {
    /// Collateral value minus debt value.
    #[inline]
    pub fn net_value(&self) -> f64 {
        self.collateral_value - self.debt_value
    }

    /// Bad debt carried by the account: `|net|` when net is negative, else 0.
    #[inline]
    pub fn shortfall(&self) -> f64 {
        let net = self.net_value();
        if net < 0.0 {
            -net
        } else {
            0.0
        }
    }

    /// Returns true if debt value exceeds collateral value.
    pub fn is_insolvent(&self) -> bool {
        self.net_value() < 0.0
    }
}

impl Account {
    /// Creates an account from its positions.
    pub fn new(id: AccountId, positions: Vec<Position>) -> Self {
        Self { id, positions }
    }

    /// The account id.
    pub fn id(&self) -> &AccountId {
        &self.id
    }

    /// The account's positions.
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Returns true if any position carries debt.
    pub fn has_debt(&self) -> bool {
        self.positions.iter().any(Position::has_debt)
    }

    /// Values the account, resolving each position's price with `resolve`.
    pub fn valuation_with<F>(&self, mut resolve: F) -> AccountValuation
    where
        F: FnMut(&Position) -> f64,
    {
        let mut valuation = AccountValuation::default();
        for position in &self.positions {
            let price = resolve(position);
            valuation.collateral_value += position.collateral_value(price);
            valuation.debt_value += position.debt_value(price);
        }
        valuation
    }

    /// Values the account against `prices`, falling back to each position's
    /// recorded price for symbols `prices` does not quote.
    ///
    /// Fallbacks are counted in [`AccountValuation::fallback_positions`].
    pub fn valuation<P: PriceSource + ?Sized>(&self, prices: &P) -> AccountValuation {
        let mut fallbacks = 0;
        let mut valuation = self.valuation_with(|position| {
            prices.price(&position.symbol).unwrap_or_else(|| {
                fallbacks += 1;
                position.reference_price
            })
        });
        valuation.fallback_positions = fallbacks;
        valuation
    }
}
