//! Identifier newtypes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Asset symbol, the unique key of an asset (e.g. `WETH`, `USDC`).
///
/// Symbols are case-sensitive: `weETH` and `WEETH` are different assets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetSymbol(String);

impl AssetSymbol {
    /// Creates a symbol, trimming surrounding whitespace.
    pub fn new(symbol: impl AsRef<str>) -> CoreResult<Self> {
        let trimmed = symbol.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CoreError::empty_identifier("asset symbol"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the symbol as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for AssetSymbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for AssetSymbol {
    type Error = CoreError;

    fn try_from(s: &str) -> CoreResult<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for AssetSymbol {
    type Error = CoreError;

    fn try_from(s: String) -> CoreResult<Self> {
        Self::new(s)
    }
}

impl From<AssetSymbol> for String {
    fn from(symbol: AssetSymbol) -> Self {
        symbol.0
    }
}

/// Borrower account identifier (typically a wallet address).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Creates an account id, trimming surrounding whitespace.
    pub fn new(id: impl AsRef<str>) -> CoreResult<Self> {
        let trimmed = id.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CoreError::empty_identifier("account"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for AccountId {
    type Error = CoreError;

    fn try_from(s: &str) -> CoreResult<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for AccountId {
    type Error = CoreError;

    fn try_from(s: String) -> CoreResult<Self> {
        Self::new(s)
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}
