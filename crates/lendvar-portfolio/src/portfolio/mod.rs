//! Portfolio snapshot type.

#[allow(clippy::module_inception)]
mod portfolio;

pub use portfolio::Portfolio;
