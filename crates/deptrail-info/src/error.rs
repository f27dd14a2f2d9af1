//! Error types for deptrail-info

use thiserror::Error;

/// Result type alias for deptrail-info operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for deptrail-info operations
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP request failed with status {status}: {url}")]
    Status {
        /// Response status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// JSON deserialization failed
    #[error("Failed to parse JSON response: {0}")]
    Json(#[from] serde_json::Error),

    /// Cache storage failed
    #[error("Cache IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid package name format
    #[error("Invalid package name: {0}")]
    InvalidPackageName(String),

    /// Package not found in registry
    #[error("Package '{0}' not found in {1} registry")]
    PackageNotFound(String, String),

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded for URL: {0}")]
    RateLimitExceeded(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Map a 404 response onto [`Error::PackageNotFound`]
    pub(crate) fn not_found_as(self, package: &str, registry: &str) -> Self {
        match self {
            Error::Status { status: 404, .. } => {
                Error::PackageNotFound(package.to_string(), registry.to_string())
            }
            other => other,
        }
    }
}
