//! Error types for core identifiers.

use thiserror::Error;

/// A specialized Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while constructing core types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// An identifier was empty or contained only whitespace.
    #[error("Empty {kind} identifier")]
    EmptyIdentifier {
        /// What kind of identifier was being built.
        kind: &'static str,
    },
}

impl CoreError {
    /// Creates an empty identifier error.
    #[must_use]
    pub fn empty_identifier(kind: &'static str) -> Self {
        Self::EmptyIdentifier { kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::empty_identifier("asset symbol");
        assert_eq!(err.to_string(), "Empty asset symbol identifier");
    }
}
