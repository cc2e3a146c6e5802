//! Linear algebra utilities.
//!
//! Correlated normal draws are produced by multiplying independent standard
//! normals by the lower Cholesky factor `L` of the target correlation matrix
//! `C = L·Lᵗ`. Correlation matrices estimated from short, overlapping price
//! histories are frequently only positive-semi-definite, so the factorization
//! here retries once with a small positive jitter on the diagonal.

use nalgebra::{Cholesky, DMatrix};

use crate::error::{MathError, MathResult};

/// Diagonal jitter used for the regularized retry.
pub const DEFAULT_CHOLESKY_JITTER: f64 = 1e-5;

/// Computes the lower Cholesky factor of a symmetric positive-definite matrix.
///
/// Only the lower triangle of `matrix` is read; symmetry is the caller's
/// responsibility.
pub fn cholesky_lower(matrix: &DMatrix<f64>) -> MathResult<DMatrix<f64>> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(MathError::not_square(n, matrix.ncols()));
    }
    if n == 0 {
        return Err(MathError::insufficient_data(1, 0));
    }

    Cholesky::new(matrix.clone())
        .map(|chol| chol.l())
        .ok_or(MathError::NotPositiveDefinite { regularized: false })
}

/// Cholesky factor of a correlation matrix, ready to correlate draw vectors.
#[derive(Debug, Clone)]
pub struct CholeskyFactor {
    lower: DMatrix<f64>,
    /// Lower triangle packed row by row: row `i` holds `i + 1` entries.
    packed: Vec<f64>,
    jitter: Option<f64>,
}

impl CholeskyFactor {
    fn from_lower(lower: DMatrix<f64>, jitter: Option<f64>) -> Self {
        let n = lower.nrows();
        let mut packed = Vec::with_capacity(n * (n + 1) / 2);
        for i in 0..n {
            for j in 0..=i {
                packed.push(lower[(i, j)]);
            }
        }
        Self {
            lower,
            packed,
            jitter,
        }
    }

    /// The lower-triangular factor `L`.
    pub fn lower(&self) -> &DMatrix<f64> {
        &self.lower
    }

    /// Dimension of the factored matrix.
    pub fn dim(&self) -> usize {
        self.lower.nrows()
    }

    /// Diagonal jitter that had to be added, if any.
    pub fn jitter(&self) -> Option<f64> {
        self.jitter
    }

    /// Returns true if the factorization needed the regularized retry.
    pub fn was_regularized(&self) -> bool {
        self.jitter.is_some()
    }

    /// Writes `L·z` into `out`.
    ///
    /// For a row vector of independent draws this equals `z·Lᵗ`, the
    /// correlated draw row for one scenario.
    ///
    /// # Panics
    ///
    /// Panics if `z` or `out` does not have length [`dim`](Self::dim).
    pub fn correlate(&self, z: &[f64], out: &mut [f64]) {
        let n = self.dim();
        assert_eq!(z.len(), n, "draw vector length must match factor dimension");
        assert_eq!(out.len(), n, "output length must match factor dimension");

        let mut offset = 0;
        for (i, slot) in out.iter_mut().enumerate() {
            let row = &self.packed[offset..=offset + i];
            *slot = row.iter().zip(z).map(|(l, x)| l * x).sum();
            offset += i + 1;
        }
    }
}

/// Factors `matrix`, retrying once with `jitter` added to the diagonal if it
/// is not positive-definite.
///
/// A second failure is reported as
/// [`MathError::NotPositiveDefinite { regularized: true }`](MathError::NotPositiveDefinite).
pub fn cholesky_with_jitter(matrix: &DMatrix<f64>, jitter: f64) -> MathResult<CholeskyFactor> {
    if !jitter.is_finite() || jitter <= 0.0 {
        return Err(MathError::invalid_input("Cholesky jitter must be positive"));
    }

    match cholesky_lower(matrix) {
        Ok(lower) => Ok(CholeskyFactor::from_lower(lower, None)),
        Err(MathError::NotPositiveDefinite { .. }) => {
            let n = matrix.nrows();
            let bumped = matrix + DMatrix::<f64>::identity(n, n) * jitter;
            cholesky_lower(&bumped)
                .map(|lower| CholeskyFactor::from_lower(lower, Some(jitter)))
                .map_err(|_| MathError::NotPositiveDefinite { regularized: true })
        }
        Err(e) => Err(e),
    }
}
