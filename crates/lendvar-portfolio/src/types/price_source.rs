//! Price lookup abstraction.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use lendvar_core::AssetSymbol;

/// Anything that can quote a price for an asset symbol.
///
/// A `None` means the source has no price for the symbol; callers decide the
/// fallback.
pub trait PriceSource {
    /// Price of `symbol`, if quoted.
    fn price(&self, symbol: &AssetSymbol) -> Option<f64>;
}

impl<S: BuildHasher> PriceSource for HashMap<AssetSymbol, f64, S> {
    fn price(&self, symbol: &AssetSymbol) -> Option<f64> {
        self.get(symbol).copied()
    }
}

impl PriceSource for BTreeMap<AssetSymbol, f64> {
    fn price(&self, symbol: &AssetSymbol) -> Option<f64> {
        self.get(symbol).copied()
    }
}

/// Prices laid out in a fixed symbol order, e.g. one simulated scenario row.
#[derive(Debug, Clone, Copy)]
pub struct IndexedPrices<'a> {
    symbols: &'a [AssetSymbol],
    prices: &'a [f64],
}

impl<'a> IndexedPrices<'a> {
    /// Pairs `symbols[i]` with `prices[i]`.
    ///
    /// # Panics
    ///
    /// Panics if the two slices differ in length.
    pub fn new(symbols: &'a [AssetSymbol], prices: &'a [f64]) -> Self {
        assert_eq!(symbols.len(), prices.len(), "one price per symbol");
        Self { symbols, prices }
    }
}

impl PriceSource for IndexedPrices<'_> {
    fn price(&self, symbol: &AssetSymbol) -> Option<f64> {
        self.symbols
            .iter()
            .position(|s| s == symbol)
            .map(|i| self.prices[i])
    }
}
