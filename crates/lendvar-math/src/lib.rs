//! # Lendvar Math
//!
//! Numerical building blocks for the Lendvar bad-debt risk engine.
//!
//! This crate provides:
//!
//! - **Linear Algebra**: Cholesky factorization of correlation matrices with a
//!   single regularized retry, and application of the factor to draw vectors
//! - **Statistics**: Sample mean, variance and correlation, and empirical
//!   percentiles with linear interpolation between order statistics
//!
//! All arithmetic is `f64`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]

pub mod error;
pub mod linear_algebra;
pub mod statistics;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{MathError, MathResult};
    pub use crate::linear_algebra::{
        cholesky_lower, cholesky_with_jitter, CholeskyFactor, DEFAULT_CHOLESKY_JITTER,
    };
    pub use crate::statistics::{
        correlation_matrix, max, mean, percentile, percentile_sorted, sample_correlation,
        sample_covariance, sample_std_dev,
    };
}

pub use error::{MathError, MathResult};
