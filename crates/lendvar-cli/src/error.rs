//! CLI error types.

use std::path::PathBuf;

use thiserror::Error;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// A file could not be read.
    #[error("Cannot read {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A CSV file is malformed.
    #[error("Malformed CSV in {path}: {source}")]
    Csv {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: csv::Error,
    },

    /// A CSV cell could not be parsed.
    #[error("Invalid value in {path}, line {line}: {reason}")]
    InvalidCell {
        /// File path.
        path: PathBuf,
        /// 1-based line number.
        line: u64,
        /// What went wrong.
        reason: String,
    },

    /// A JSON file is malformed.
    #[error("Malformed JSON in {path}: {source}")]
    Json {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// A TOML file is malformed.
    #[error("Malformed TOML in {path}: {source}")]
    Toml {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: toml::de::Error,
    },

    /// A command argument is out of range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;
