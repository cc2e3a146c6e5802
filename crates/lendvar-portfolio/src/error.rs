//! Error types for portfolio construction.

use lendvar_core::CoreError;
use thiserror::Error;

/// Result type for portfolio operations.
pub type PortfolioResult<T> = Result<T, PortfolioError>;

/// Errors that can occur while building a portfolio snapshot.
#[derive(Error, Debug, Clone)]
pub enum PortfolioError {
    /// A position record carries an invalid value.
    #[error("Invalid position for account '{account}' in {symbol}: {reason}")]
    InvalidPosition {
        /// The owning account.
        account: String,
        /// The position's asset symbol.
        symbol: String,
        /// The reason the position is invalid.
        reason: String,
    },

    /// An identifier could not be parsed.
    #[error("Invalid identifier: {0}")]
    Identifier(#[from] CoreError),
}

impl PortfolioError {
    /// Create an invalid position error.
    #[must_use]
    pub fn invalid_position(
        account: impl Into<String>,
        symbol: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidPosition {
            account: account.into(),
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PortfolioError::invalid_position("0xabc", "WETH", "negative debt amount");
        let text = err.to_string();
        assert!(text.contains("0xabc"));
        assert!(text.contains("WETH"));
        assert!(text.contains("negative debt amount"));
    }
}
