//! Spool HTTP Client
//!
//! HTTP implementation of the remote fetcher: one authenticated form POST to
//! the print endpoint per call, classified into a [`spool_core::FetchResult`].
//!
//! # Example
//!
//! ```no_run
//! use spool_client::PrintServerClient;
//! use spool_core::{Credentials, Fetcher};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PrintServerClient::new("https://print.example.com/what_to_print")?;
//!
//!     match client.fetch(&Credentials::new("alice", "secret")).await {
//!         Ok(payload) => print!("{}", payload),
//!         Err(failure) => eprintln!("fetch failed: {}", failure),
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
mod fetch;

pub use error::{ClientError, Result};

use reqwest::{Client, Url};
use spool_core::StatusPolicy;
use std::time::Duration;

/// Connect and read timeouts for a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTimeouts {
    pub connect: Duration,
    pub read: Duration,
}

impl Default for FetchTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_millis(5000),
            read: Duration::from_millis(5000),
        }
    }
}

/// HTTP client for the print server
#[derive(Debug, Clone)]
pub struct PrintServerClient {
    /// Full URL of the print endpoint (e.g., "https://host/what_to_print")
    endpoint: String,
    /// HTTP client instance
    client: Client,
    /// Which response statuses count as success
    policy: StatusPolicy,
}

impl PrintServerClient {
    /// Create a client with the default 5 s connect and read timeouts
    ///
    /// # Example
    /// ```
    /// use spool_client::PrintServerClient;
    ///
    /// let client = PrintServerClient::new("https://localhost:8443/what_to_print").unwrap();
    /// assert_eq!(client.endpoint(), "https://localhost:8443/what_to_print");
    /// ```
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_timeouts(endpoint, FetchTimeouts::default())
    }

    /// Create a client with explicit timeouts
    ///
    /// Only the connect and per-read phases are bounded; a response that keeps
    /// trickling in within the read timeout is never cut off.
    pub fn with_timeouts(endpoint: impl Into<String>, timeouts: FetchTimeouts) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeouts.connect)
            .read_timeout(timeouts.read)
            .build()?;

        Self::with_client(endpoint, client)
    }

    /// Create a client around a preconfigured reqwest Client
    ///
    /// This allows you to configure proxies, TLS settings, etc. Timeouts are
    /// whatever the given client was built with.
    pub fn with_client(endpoint: impl Into<String>, client: Client) -> Result<Self> {
        let endpoint = endpoint.into();
        let url = Url::parse(&endpoint)
            .map_err(|e| ClientError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidEndpoint(format!(
                "{}: scheme must be http or https",
                endpoint
            )));
        }

        Ok(Self {
            endpoint,
            client,
            policy: StatusPolicy::default(),
        })
    }

    /// Replace the response status policy
    pub fn with_policy(mut self, policy: StatusPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Get the endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Get the active status policy
    pub fn policy(&self) -> StatusPolicy {
        self.policy
    }
}
