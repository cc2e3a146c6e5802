//! Portfolio snapshot.

use std::collections::{BTreeMap, BTreeSet};

use lendvar_core::{AccountId, AssetSymbol};
use serde::{Deserialize, Serialize};

use crate::error::PortfolioResult;
use crate::types::{Account, Position, PositionRecord};

/// The protocol's borrower book at one point in time.
///
/// Accounts are kept sorted by id so every pass over the portfolio visits
/// them, and sums their values, in the same order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    accounts: Vec<Account>,
}

impl Portfolio {
    /// Groups flat position records into accounts.
    ///
    /// Fails on the first record with a negative or non-finite amount or
    /// reference price.
    pub fn from_records<I>(records: I) -> PortfolioResult<Self>
    where
        I: IntoIterator<Item = PositionRecord>,
    {
        let mut grouped: BTreeMap<AccountId, Vec<Position>> = BTreeMap::new();
        for record in records {
            let (account_id, position) = record.into_parts()?;
            grouped.entry(account_id).or_default().push(position);
        }

        let accounts = grouped
            .into_iter()
            .map(|(id, positions)| Account::new(id, positions))
            .collect();

        Ok(Self { accounts })
    }

    /// Builds a portfolio from already grouped accounts.
    ///
    /// Accounts sharing an id are merged.
    pub fn from_accounts(accounts: Vec<Account>) -> Self {
        let mut grouped: BTreeMap<AccountId, Vec<Position>> = BTreeMap::new();
        for account in accounts {
            grouped
                .entry(account.id().clone())
                .or_default()
                .extend(account.positions().iter().cloned());
        }
        Self {
            accounts: grouped
                .into_iter()
                .map(|(id, positions)| Account::new(id, positions))
                .collect(),
        }
    }

    /// Accounts, sorted by id.
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Looks up an account by id.
    pub fn account(&self, id: &AccountId) -> Option<&Account> {
        self.accounts
            .binary_search_by(|a| a.id().cmp(id))
            .ok()
            .map(|i| &self.accounts[i])
    }

    /// Number of accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns true if the portfolio has no accounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Total number of positions across accounts.
    #[must_use]
    pub fn position_count(&self) -> usize {
        self.accounts.iter().map(|a| a.positions().len()).sum()
    }

    /// Every asset symbol referenced by a position.
    #[must_use]
    pub fn symbols(&self) -> BTreeSet<AssetSymbol> {
        self.accounts
            .iter()
            .flat_map(|a| a.positions().iter().map(|p| p.symbol.clone()))
            .collect()
    }

    /// Accounts holding any debt.
    pub fn active_accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter().filter(|a| a.has_debt())
    }
}
