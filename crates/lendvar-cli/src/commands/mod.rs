//! CLI command implementations.

pub mod asset_risk;
pub mod calibrate;
pub mod simulate;
pub mod snapshot;

// Re-export submodules for convenience
pub use asset_risk::AssetRiskArgs;
pub use calibrate::CalibrateArgs;
pub use simulate::SimulateArgs;
pub use snapshot::SnapshotArgs;

use lendvar_risk::RiskTerm;

use crate::error::{CliError, CliResult};

/// Builds terms from day counts, naming 30, 90 and 365 days Short, Mid and
/// Long so they line up with calibrated windows.
pub fn terms_from_days(days: &[u32]) -> CliResult<Vec<RiskTerm>> {
    if days.contains(&0) {
        return Err(CliError::InvalidArgument(
            "term days must be at least 1".to_string(),
        ));
    }
    Ok(days
        .iter()
        .map(|&d| match d {
            30 => RiskTerm::short(),
            90 => RiskTerm::mid(),
            365 => RiskTerm::long(),
            d => RiskTerm::new(format!("{d}d"), d),
        })
        .collect())
}

/// Validates a confidence level in percent.
pub fn validate_percentile(percentile: f64) -> CliResult<f64> {
    if !(percentile > 0.0 && percentile < 100.0) {
        return Err(CliError::InvalidArgument(format!(
            "percentile {percentile} must be between 0 and 100"
        )));
    }
    Ok(percentile)
}

/// Validates a scenario count.
pub fn validate_scenarios(scenarios: usize) -> CliResult<usize> {
    if scenarios == 0 {
        return Err(CliError::InvalidArgument(
            "scenarios must be at least 1".to_string(),
        ));
    }
    Ok(scenarios)
}
