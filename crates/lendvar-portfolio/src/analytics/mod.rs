//! Portfolio-level analytics.
//!
//! - Scenario revaluation: protocol-wide shortfall for one price scenario,
//!   either through a symbol map or a precompiled [`RevaluationPlan`]
//! - Current bad debt at recorded prices, attributed to debt assets
//!
//! All functions are pure - they take the portfolio, prices and
//! configuration as input and return computed results.

mod parallel;
mod revaluation;
mod snapshot;

pub use parallel::*;
pub use revaluation::*;
pub use snapshot::*;
