//! Common error types for RefMerge

use thiserror::Error;

/// Common result type for RefMerge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the RefMerge pipeline
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error: a prior table entry is missing or malformed.
    /// Fatal for the affected document's merge; never retried internally.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Shape mismatch between aligned groups and belief records
    /// (an integration defect, not a data error)
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O error while loading configuration (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Priors file could not be parsed as TOML
    #[error("Priors parse error: {0}")]
    PriorsParse(#[from] toml::de::Error),
}
