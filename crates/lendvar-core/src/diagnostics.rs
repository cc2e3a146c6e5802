//! Data-quality diagnostics.
//!
//! Some input problems degrade a run without invalidating it: a market
//! parameter defaulted to zero, a scenario price replaced by a position's
//! recorded price, a correlation matrix nudged to positive-definiteness.
//! These are never errors. Each one is recorded as a [`DataQualityIssue`]
//! and emitted as a `warn` event at the moment it is recorded, so a run
//! never substitutes a value without leaving a trace.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::AssetSymbol;

/// A recoverable data-quality problem encountered during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityIssue {
    /// The asset has no spot price; it was simulated from a price of zero.
    MissingSpotPrice {
        /// Affected asset.
        symbol: AssetSymbol,
    },

    /// The asset has no volatility; it was simulated as deterministic.
    MissingVolatility {
        /// Affected asset.
        symbol: AssetSymbol,
    },

    /// A market entry names an asset outside the correlation ordering.
    UnusedMarketEntry {
        /// Ignored asset.
        symbol: AssetSymbol,
    },

    /// The correlation matrix was not positive-definite and was regularized.
    CorrelationRegularized {
        /// Value added to every diagonal entry.
        jitter: f64,
    },

    /// Positions in this asset were revalued at their recorded price because
    /// the scenario carries no price for it.
    ScenarioPriceFallback {
        /// Asset missing from the scenario.
        symbol: AssetSymbol,
        /// Number of positions that used their recorded price.
        positions: usize,
    },
}

impl DataQualityIssue {
    /// Short machine-readable label for the issue kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingSpotPrice { .. } => "missing_spot_price",
            Self::MissingVolatility { .. } => "missing_volatility",
            Self::UnusedMarketEntry { .. } => "unused_market_entry",
            Self::CorrelationRegularized { .. } => "correlation_regularized",
            Self::ScenarioPriceFallback { .. } => "scenario_price_fallback",
        }
    }
}

impl fmt::Display for DataQualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSpotPrice { symbol } => {
                write!(f, "{symbol}: no spot price, defaulted to 0")
            }
            Self::MissingVolatility { symbol } => {
                write!(f, "{symbol}: no volatility, defaulted to 0")
            }
            Self::UnusedMarketEntry { symbol } => {
                write!(f, "{symbol}: not in the correlation ordering, ignored")
            }
            Self::CorrelationRegularized { jitter } => {
                write!(
                    f,
                    "correlation matrix not positive-definite, added {jitter:e} to the diagonal"
                )
            }
            Self::ScenarioPriceFallback { symbol, positions } => {
                write!(
                    f,
                    "{symbol}: absent from scenarios, {positions} position(s) valued at recorded price"
                )
            }
        }
    }
}

/// Ordered collection of the data-quality issues seen during a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    issues: Vec<DataQualityIssue>,
}

impl Diagnostics {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an issue and emits it as a `warn` event.
    pub fn record(&mut self, issue: DataQualityIssue) {
        tracing::warn!(kind = issue.kind(), "{}", issue);
        self.issues.push(issue);
    }

    /// Appends every issue of `other` without logging them again.
    pub fn extend(&mut self, other: Diagnostics) {
        self.issues.extend(other.issues);
    }

    /// Iterates over the recorded issues in recording order.
    pub fn iter(&self) -> impl Iterator<Item = &DataQualityIssue> {
        self.issues.iter()
    }

    /// Number of recorded issues.
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns true if an issue of the given kind was recorded.
    pub fn contains_kind(&self, kind: &str) -> bool {
        self.issues.iter().any(|issue| issue.kind() == kind)
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a DataQualityIssue;
    type IntoIter = std::slice::Iter<'a, DataQualityIssue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.iter()
    }
}
