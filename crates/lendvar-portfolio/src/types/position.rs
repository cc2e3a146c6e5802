//! Position records and positions.

use lendvar_core::{AccountId, AssetSymbol};
use serde::{Deserialize, Serialize};

use crate::error::{PortfolioError, PortfolioResult};

/// One row of the flat portfolio snapshot handed to the engine.
///
/// Records are grouped by `account_id` into [`Account`](super::Account)s when
/// the [`Portfolio`](crate::Portfolio) is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    /// Owning account.
    pub account_id: AccountId,
    /// Asset the amounts are denominated in.
    pub symbol: AssetSymbol,
    /// Supplied balance, in asset units.
    pub collateral_amount: f64,
    /// Borrowed balance, in asset units.
    pub debt_amount: f64,
    /// Whether the supplied balance is pledged as collateral.
    pub is_collateral: bool,
    /// Price recorded with the snapshot; only used when a scenario has no
    /// price for `symbol`.
    pub reference_price: f64,
}

impl PositionRecord {
    /// Validates the record and splits off its account id.
    pub fn into_parts(self) -> PortfolioResult<(AccountId, Position)> {
        let position = Position {
            symbol: self.symbol,
            collateral_amount: self.collateral_amount,
            debt_amount: self.debt_amount,
            is_collateral: self.is_collateral,
            reference_price: self.reference_price,
        };
        position.validate(&self.account_id)?;
        Ok((self.account_id, position))
    }
}

/// A single-asset balance inside an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Asset the amounts are denominated in.
    pub symbol: AssetSymbol,
    /// Supplied balance, in asset units.
    pub collateral_amount: f64,
    /// Borrowed balance, in asset units.
    pub debt_amount: f64,
    /// Whether the supplied balance counts toward collateral value.
    pub is_collateral: bool,
    /// Fallback price recorded with the snapshot.
    pub reference_price: f64,
}

impl Position {
    /// Creates a position.
    pub fn new(
        symbol: AssetSymbol,
        collateral_amount: f64,
        debt_amount: f64,
        is_collateral: bool,
        reference_price: f64,
    ) -> Self {
        Self {
            symbol,
            collateral_amount,
            debt_amount,
            is_collateral,
            reference_price,
        }
    }

    fn validate(&self, account: &AccountId) -> PortfolioResult<()> {
        let checks = [
            ("collateral amount", self.collateral_amount),
            ("debt amount", self.debt_amount),
            ("reference price", self.reference_price),
        ];
        for (field, value) in checks {
            if !value.is_finite() || value < 0.0 {
                return Err(PortfolioError::invalid_position(
                    account.as_str(),
                    self.symbol.as_str(),
                    format!("{field} must be finite and non-negative, got {value}"),
                ));
            }
        }
        Ok(())
    }

    /// Collateral value at `price`; zero unless the position is pledged.
    #[inline]
    pub fn collateral_value(&self, price: f64) -> f64 {
        if self.is_collateral {
            self.collateral_amount * price
        } else {
            0.0
        }
    }

    /// Debt value at `price`, pledged or not.
    #[inline]
    pub fn debt_value(&self, price: f64) -> f64 {
        self.debt_amount * price
    }

    /// Returns true if the position carries any debt.
    pub fn has_debt(&self) -> bool {
        self.debt_amount > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(collateral: f64, debt: f64, price: f64) -> PositionRecord {
        PositionRecord {
            account_id: AccountId::new("0xabc").unwrap(),
            symbol: AssetSymbol::new("WETH").unwrap(),
            collateral_amount: collateral,
            debt_amount: debt,
            is_collateral: true,
            reference_price: price,
        }
    }

    #[test]
    fn test_valid_record_splits() {
        let (account, position) = record(1.5, 0.0, 3000.0).into_parts().unwrap();
        assert_eq!(account.as_str(), "0xabc");
        assert_eq!(position.symbol.as_str(), "WETH");
        assert_eq!(position.collateral_amount, 1.5);
    }

    #[test]
    fn test_negative_or_nan_amounts_rejected() {
        assert!(record(-1.0, 0.0, 1.0).into_parts().is_err());
        assert!(record(1.0, f64::NAN, 1.0).into_parts().is_err());
        assert!(record(1.0, 0.0, f64::INFINITY).into_parts().is_err());
    }

    #[test]
    fn test_unpledged_balance_has_no_collateral_value() {
        let mut position = Position::new(AssetSymbol::new("USDC").unwrap(), 100.0, 20.0, false, 1.0);
        assert_eq!(position.collateral_value(1.0), 0.0);
        assert_eq!(position.debt_value(1.0), 20.0);

        position.is_collateral = true;
        assert_eq!(position.collateral_value(0.5), 50.0);
    }
}
