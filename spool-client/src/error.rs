//! Error types for the spool client

use thiserror::Error;

/// Result type alias for client construction
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when setting up the print server client
///
/// Fetch outcomes are not errors of this type; they are reported as
/// [`spool_core::FetchFailure`] so a cycle can always classify them.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The underlying HTTP client could not be built
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),

    /// Endpoint is not an absolute http(s) URL
    #[error("invalid endpoint URL: {0}")]
    InvalidEndpoint(String),
}
