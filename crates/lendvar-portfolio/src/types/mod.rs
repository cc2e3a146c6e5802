//! Domain types for the portfolio snapshot.
//!
//! - [`PositionRecord`]: one flat input row (account, asset, amounts, flag, price)
//! - [`Position`]: a single-asset balance inside an account
//! - [`Account`]: all positions of one borrower, and its [`AccountValuation`]
//! - [`PriceSource`]: price lookup by symbol
//! - [`RevaluationConfig`]: parallelism settings

mod account;
mod config;
mod position;
mod price_source;

pub use account::{Account, AccountValuation};
pub use config::RevaluationConfig;
pub use position::{Position, PositionRecord};
pub use price_source::{IndexedPrices, PriceSource};
