//! Sample statistics.
//!
//! Empirical reductions used by market calibration and by the tail-risk
//! analyzer. Percentiles follow the usual linear-interpolation definition:
//! for `n` sorted observations the `p`-th percentile sits at fractional rank
//! `h = (n - 1)·p/100`, interpolated between the neighbouring order
//! statistics.

use statrs::statistics::Statistics;

use crate::error::{MathError, MathResult};

fn require_non_empty(values: &[f64]) -> MathResult<()> {
    if values.is_empty() {
        return Err(MathError::insufficient_data(1, 0));
    }
    Ok(())
}

fn require_percent(p: f64) -> MathResult<()> {
    if !(0.0..=100.0).contains(&p) {
        return Err(MathError::invalid_input(format!(
            "percentile must be within [0, 100], got {p}"
        )));
    }
    Ok(())
}

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> MathResult<f64> {
    require_non_empty(values)?;
    Ok(values.iter().mean())
}

/// Largest value.
pub fn max(values: &[f64]) -> MathResult<f64> {
    require_non_empty(values)?;
    Ok(values.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

/// Sample standard deviation (`n - 1` denominator).
pub fn sample_std_dev(values: &[f64]) -> MathResult<f64> {
    if values.len() < 2 {
        return Err(MathError::insufficient_data(2, values.len()));
    }
    Ok(values.iter().std_dev())
}

/// `p`-th percentile of already sorted, finite values.
///
/// `sorted` must be in ascending order; this is not re-checked.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> MathResult<f64> {
    require_non_empty(sorted)?;
    require_percent(p)?;

    let n = sorted.len();
    let rank = (n - 1) as f64 * p / 100.0;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;

    // Rounding must not push the interpolant past the upper order statistic.
    Ok((sorted[lo] + frac * (sorted[hi] - sorted[lo])).min(sorted[hi]))
}

/// `p`-th percentile of `values` (any order), `p` in `[0, 100]`.
pub fn percentile(values: &[f64], p: f64) -> MathResult<f64> {
    require_non_empty(values)?;
    if values.iter().any(|v| v.is_nan()) {
        return Err(MathError::invalid_input("percentile input contains NaN"));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    percentile_sorted(&sorted, p)
}

/// Sample covariance (`n - 1` denominator) of two equally long series.
pub fn sample_covariance(x: &[f64], y: &[f64]) -> MathResult<f64> {
    if x.len() != y.len() {
        return Err(MathError::DimensionMismatch {
            rows1: x.len(),
            cols1: 1,
            rows2: y.len(),
            cols2: 1,
        });
    }
    if x.len() < 2 {
        return Err(MathError::insufficient_data(2, x.len()));
    }
    Ok(x.iter().covariance(y.iter()))
}

/// Pearson sample correlation of two equally long series.
///
/// A series with zero variance carries no co-movement information; its
/// correlation with anything is reported as `0.0`.
pub fn sample_correlation(x: &[f64], y: &[f64]) -> MathResult<f64> {
    if x.len() != y.len() {
        return Err(MathError::DimensionMismatch {
            rows1: x.len(),
            cols1: 1,
            rows2: y.len(),
            cols2: 1,
        });
    }
    if x.len() < 2 {
        return Err(MathError::insufficient_data(2, x.len()));
    }

    let sx = x.iter().std_dev();
    let sy = y.iter().std_dev();
    if sx == 0.0 || sy == 0.0 {
        return Ok(0.0);
    }

    let cov = x.iter().covariance(y.iter());
    Ok((cov / (sx * sy)).clamp(-1.0, 1.0))
}

/// Pairwise correlation matrix of equally long columns, row-major `k x k`.
///
/// The diagonal is exactly `1.0`.
pub fn correlation_matrix(columns: &[Vec<f64>]) -> MathResult<Vec<Vec<f64>>> {
    let k = columns.len();
    let mut matrix = vec![vec![0.0; k]; k];
    for i in 0..k {
        matrix[i][i] = 1.0;
        for j in 0..i {
            let rho = sample_correlation(&columns[i], &columns[j])?;
            matrix[i][j] = rho;
            matrix[j][i] = rho;
        }
    }
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_percentile_linear_interpolation() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];

        assert_relative_eq!(percentile(&values, 0.0).unwrap(), 1.0);
        assert_relative_eq!(percentile(&values, 100.0).unwrap(), 10.0);
        assert_relative_eq!(percentile(&values, 50.0).unwrap(), 5.5);
        // rank = 9 * 0.999 = 8.991
        assert_relative_eq!(percentile(&values, 99.9).unwrap(), 9.991, epsilon = 1e-12);
        // rank = 9 * 0.95 = 8.55
        assert_relative_eq!(percentile(&values, 95.0).unwrap(), 9.55, epsilon = 1e-12);
    }

    #[test]
    fn test_percentile_unsorted_input() {
        let values = [5.0, 1.0, 4.0, 2.0, 3.0];
        assert_relative_eq!(percentile(&values, 25.0).unwrap(), 2.0);
        assert_relative_eq!(percentile(&values, 90.0).unwrap(), 4.6, epsilon = 1e-12);
    }

    #[test]
    fn test_percentile_single_value() {
        assert_relative_eq!(percentile(&[42.0], 99.9).unwrap(), 42.0);
    }

    #[test]
    fn test_percentile_rejects_bad_input() {
        assert!(percentile(&[], 50.0).is_err());
        assert!(percentile(&[1.0], -0.1).is_err());
        assert!(percentile(&[1.0], 100.1).is_err());
        assert!(percentile(&[1.0, f64::NAN], 50.0).is_err());
    }

    #[test]
    fn test_mean_and_max() {
        let values = [0.0, 2.0, 4.0, 10.0];
        assert_relative_eq!(mean(&values).unwrap(), 4.0);
        assert_relative_eq!(max(&values).unwrap(), 10.0);
        assert!(mean(&[]).is_err());
        assert!(max(&[]).is_err());
    }

    #[test]
    fn test_sample_std_dev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        // Sample variance = 32 / 7
        assert_relative_eq!(
            sample_std_dev(&values).unwrap(),
            (32.0_f64 / 7.0).sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_sample_correlation() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 6.0, 8.0, 10.0];
        let z = [5.0, 4.0, 3.0, 2.0, 1.0];
        let flat = [3.0; 5];

        assert_relative_eq!(sample_correlation(&x, &y).unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(sample_correlation(&x, &z).unwrap(), -1.0, epsilon = 1e-12);
        assert_eq!(sample_correlation(&x, &flat).unwrap(), 0.0);
        assert!(sample_correlation(&x, &y[..3]).is_err());
    }

    #[test]
    fn test_sample_covariance() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        // var(x) = 5/3, cov(x, 2x) = 10/3
        assert_relative_eq!(sample_covariance(&x, &x).unwrap(), 5.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(sample_covariance(&x, &y).unwrap(), 10.0 / 3.0, epsilon = 1e-12);
        assert!(sample_covariance(&x[..1], &y[..1]).is_err());
    }

    #[test]
    fn test_correlation_matrix_symmetric_unit_diagonal() {
        let columns = vec![
            vec![0.01, -0.02, 0.015, 0.0, -0.01],
            vec![0.012, -0.018, 0.01, 0.002, -0.012],
            vec![0.0, 0.001, -0.001, 0.0005, 0.0],
        ];
        let m = correlation_matrix(&columns).unwrap();
        for i in 0..3 {
            assert_eq!(m[i][i], 1.0);
            for j in 0..3 {
                assert_eq!(m[i][j], m[j][i]);
                assert!(m[i][j].abs() <= 1.0);
            }
        }
        assert!(m[0][1] > 0.9);
    }

    proptest! {
        #[test]
        fn prop_percentile_monotone_and_bounded(
            values in prop::collection::vec(0.0f64..1e9, 1..200),
            p in 0.0f64..100.0,
            q in 0.0f64..100.0,
        ) {
            let (lo, hi) = if p <= q { (p, q) } else { (q, p) };
            let v_lo = percentile(&values, lo).unwrap();
            let v_hi = percentile(&values, hi).unwrap();
            prop_assert!(v_lo <= v_hi);

            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max_v = max(&values).unwrap();
            prop_assert!(v_lo >= min && v_hi <= max_v);
        }
    }
}
