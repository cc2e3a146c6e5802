//! Parallel processing utilities for revaluation passes.
//!
//! Provides conditional parallel iteration based on configuration
//! and collection size. Uses rayon when the `parallel` feature is enabled.
//! Every helper returns results in input order, so switching between the
//! sequential and parallel path never reorders a scenario distribution.

use crate::types::RevaluationConfig;

/// Maps a function over items, conditionally using parallel iteration.
///
/// Uses parallel iteration when:
/// - The `parallel` feature is enabled
/// - `config.parallel` is true
/// - The collection size reaches `config.parallel_threshold`
#[allow(unused_variables)]
pub fn maybe_parallel_map<T, U, F>(items: &[T], config: &RevaluationConfig, f: F) -> Vec<U>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> U + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        if config.should_parallelize(items.len()) {
            return items.par_iter().map(f).collect();
        }
    }

    items.iter().map(f).collect()
}

/// Maps a function over consecutive rows of `width` values.
///
/// `values.len()` must be a multiple of `width`; a trailing partial row is
/// ignored.
///
/// # Panics
///
/// Panics if `width` is zero.
#[allow(unused_variables)]
pub fn maybe_parallel_rows_map<U, F>(
    values: &[f64],
    width: usize,
    config: &RevaluationConfig,
    f: F,
) -> Vec<U>
where
    U: Send,
    F: Fn(&[f64]) -> U + Sync + Send,
{
    assert!(width > 0, "row width must be positive");

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        if config.should_parallelize(values.len() / width) {
            return values.par_chunks_exact(width).map(f).collect();
        }
    }

    values.chunks_exact(width).map(f).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maybe_parallel_map() {
        let config = RevaluationConfig::sequential();
        let items = vec![1, 2, 3, 4, 5];
        let results: Vec<i32> = maybe_parallel_map(&items, &config, |x| x * 2);
        assert_eq!(results, vec![2, 4, 6, 8, 10]);
    }

    #[test]
    fn test_maybe_parallel_rows_map_keeps_order() {
        let values: Vec<f64> = (0..1000).map(f64::from).collect();
        let sequential =
            maybe_parallel_rows_map(&values, 4, &RevaluationConfig::sequential(), |row| row.iter().sum::<f64>());
        let parallel = maybe_parallel_rows_map(
            &values,
            4,
            &RevaluationConfig::new().with_threshold(1),
            |row| row.iter().sum::<f64>(),
        );
        assert_eq!(sequential.len(), 250);
        assert_eq!(sequential, parallel);
        assert_eq!(sequential[0], 6.0);
    }
}
