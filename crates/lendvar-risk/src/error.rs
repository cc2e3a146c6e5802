//! Error types for risk calculations.

use lendvar_core::CoreError;
use lendvar_math::MathError;
use lendvar_portfolio::PortfolioError;
use thiserror::Error;

/// A specialized Result type for risk calculations.
pub type RiskResult<T> = Result<T, RiskError>;

/// Errors that can occur while setting up or running a simulation.
///
/// Every variant aborts before scenario work starts; a run either produces
/// a complete distribution or an error. Recoverable input problems are
/// reported through [`lendvar_core::Diagnostics`] instead.
#[derive(Debug, Error, Clone)]
pub enum RiskError {
    /// Malformed correlation matrix, invalid market value, invalid
    /// simulation settings, or a matrix that stays indefinite after
    /// regularization.
    #[error("configuration error: {reason}")]
    Configuration {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// Asset ordering and correlation matrix disagree in size, or the
    /// ordering repeats a symbol.
    #[error("input shape error: {reason}")]
    InputShape {
        /// Description of the mismatch.
        reason: String,
    },

    /// Invalid input parameters
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Insufficient data for calculation
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Numerical error from the math crate.
    #[error(transparent)]
    Math(#[from] MathError),

    /// Invalid portfolio input.
    #[error(transparent)]
    Portfolio(#[from] PortfolioError),

    /// Invalid identifier.
    #[error(transparent)]
    Identifier(#[from] CoreError),
}

impl RiskError {
    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Creates an input shape error.
    #[must_use]
    pub fn input_shape(reason: impl Into<String>) -> Self {
        Self::InputShape {
            reason: reason.into(),
        }
    }

    /// Returns true for errors caused by the run's configuration or inputs
    /// rather than by the data handed to a reduction.
    pub fn is_fatal_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::InputShape { .. })
    }
}
