//! Print endpoint fetch

use async_trait::async_trait;
use serde::Serialize;
use spool_core::domain::fetch::normalize_payload;
use spool_core::{Credentials, FetchFailure, FetchResult, Fetcher};
use tracing::{debug, warn};

use crate::PrintServerClient;

/// Form body of a fetch request
#[derive(Debug, Serialize)]
struct LoginForm<'a> {
    username: &'a str,
    password: &'a str,
}

#[async_trait]
impl Fetcher for PrintServerClient {
    /// POST the credentials as a form and return the body as the payload
    ///
    /// Callers are expected to pass complete credentials; the request is
    /// sent as-is otherwise.
    async fn fetch(&self, credentials: &Credentials) -> FetchResult {
        debug!("Fetching print payload for {}", credentials.username());

        let response = self
            .client
            .post(&self.endpoint)
            .form(&LoginForm {
                username: credentials.username(),
                password: credentials.password(),
            })
            .send()
            .await
            .map_err(transport_failure)?;

        let status = response.status().as_u16();
        if let Err(failure) = self.policy.classify(status) {
            warn!("Print server returned status {}", status);
            return Err(failure);
        }

        let body = response.text().await.map_err(transport_failure)?;
        debug!("Received {} byte payload (status {})", body.len(), status);

        Ok(normalize_payload(&body))
    }
}

impl PrintServerClient {
    /// One-shot login check
    ///
    /// Returns true exactly when a fetch with these credentials succeeds.
    /// The payload, if any, is dropped.
    pub async fn verify_login(&self, credentials: &Credentials) -> bool {
        match self.fetch(credentials).await {
            Ok(_) => true,
            Err(failure) => {
                warn!("Login check failed: {}", failure);
                false
            }
        }
    }
}

fn transport_failure(err: reqwest::Error) -> FetchFailure {
    if err.is_timeout() {
        FetchFailure::Timeout
    } else {
        warn!("Request to print server failed: {}", err);
        FetchFailure::Network
    }
}
