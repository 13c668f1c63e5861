//! Remote fetch domain types
//!
//! A fetch is one authenticated POST to the print endpoint. Its outcome is
//! either the payload to print or a [`FetchFailure`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::credentials::Credentials;

/// Outcome of a single fetch
pub type FetchResult = std::result::Result<String, FetchFailure>;

/// Why a fetch did not produce a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum FetchFailure {
    /// Connect, DNS, TLS, or body read failure
    #[error("network error")]
    Network,

    /// Connect or read timeout exceeded
    #[error("request timed out")]
    Timeout,

    /// Status rejected by the configured policy, other than the auth code
    #[error("server error (status {0})")]
    ServerError(u16),

    /// Server refused the credentials
    #[error("credentials rejected by server")]
    AuthRejected,
}

/// Decides which HTTP statuses count as a successful, authenticated fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusPolicy {
    /// Every status except the given one is accepted
    RejectOnly(u16),
    /// Only 2xx statuses are accepted
    Require2xx,
}

/// Status the print server uses to refuse credentials
pub const AUTH_REJECTED_STATUS: u16 = 400;

impl StatusPolicy {
    /// Classifies a response status
    ///
    /// Returns `Ok(())` when the body should be read as the payload.
    pub fn classify(&self, status: u16) -> Result<(), FetchFailure> {
        match self {
            Self::RejectOnly(rejected) if status == *rejected => Err(FetchFailure::AuthRejected),
            Self::RejectOnly(_) => Ok(()),
            Self::Require2xx if (200..300).contains(&status) => Ok(()),
            Self::Require2xx if status == AUTH_REJECTED_STATUS => Err(FetchFailure::AuthRejected),
            Self::Require2xx => Err(FetchFailure::ServerError(status)),
        }
    }

    /// Parses the `STATUS_POLICY` configuration value
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "require-2xx" => Some(Self::Require2xx),
            other => other
                .strip_prefix("reject-")
                .and_then(|code| code.parse::<u16>().ok())
                .map(Self::RejectOnly),
        }
    }
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self::RejectOnly(AUTH_REJECTED_STATUS)
    }
}

/// Rebuilds a response body into a print payload
///
/// Each line of the body is terminated with `\n`, whatever line ending the
/// server used. An empty body yields an empty payload.
pub fn normalize_payload(body: &str) -> String {
    body.lines().fold(String::with_capacity(body.len() + 1), |mut acc, line| {
        acc.push_str(line);
        acc.push('\n');
        acc
    })
}

/// Source of print payloads
///
/// Implemented by the HTTP client; the scheduler only sees this trait.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Performs one authenticated fetch
    async fn fetch(&self, credentials: &Credentials) -> FetchResult;
}
