//! # Lendvar Core
//!
//! Core types shared by every crate of the Lendvar bad-debt risk engine.
//!
//! - **Identifiers**: [`AssetSymbol`] and [`AccountId`] newtypes, so a symbol
//!   can never be passed where an account id is expected
//! - **Diagnostics**: [`DataQualityIssue`] and the [`Diagnostics`] collector
//!   for recoverable input problems that degrade a run without aborting it
//! - **Errors**: [`CoreError`] for identifier validation
//!
//! ## Example
//!
//! ```rust
//! use lendvar_core::prelude::*;
//!
//! let weth = AssetSymbol::new("WETH").unwrap();
//! let mut diagnostics = Diagnostics::new();
//! diagnostics.record(DataQualityIssue::MissingVolatility { symbol: weth });
//! assert_eq!(diagnostics.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

pub mod diagnostics;
pub mod error;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::diagnostics::{DataQualityIssue, Diagnostics};
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::types::{AccountId, AssetSymbol};
}

pub use diagnostics::{DataQualityIssue, Diagnostics};
pub use error::{CoreError, CoreResult};
pub use types::{AccountId, AssetSymbol};
