//! Error types for deptrail-deps

use thiserror::Error;

/// Result type alias using deptrail-deps Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in deptrail-deps
///
/// Manifest and lockfile parsing never fails; these only surface while
/// setting up an [`Inventory`](crate::Inventory) against real collaborators.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] deptrail_config::ConfigError),

    /// Registry client could not be constructed
    #[error("Registry error: {0}")]
    Info(#[from] deptrail_info::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}
