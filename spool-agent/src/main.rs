//! Spool Agent
//!
//! A background worker that polls a print server and forwards what it
//! receives to a local printer.
//!
//! Architecture:
//! - Configuration: Load settings from environment or defaults
//! - Services: Credential store and output sink session
//! - Sinks: Output device adapters (stdout, printer device node)
//! - Scheduler: Poll loop driving fetch and print cycles
//!
//! The agent authenticates with the credentials it was started with on every
//! cycle, prints whatever the server returns, and keeps polling through
//! network, server and printer failures until it is told to stop.

mod config;
mod scheduler;
mod service;
mod sinks;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, info_span, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::scheduler::{PollScheduler, SchedulerHandle};
use crate::service::{CredentialStore, SessionManager};
use spool_client::PrintServerClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spool_agent=info,spool_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Spool Agent");

    // Load configuration
    let config = load_config()?;
    info!(
        "Loaded configuration: agent_id={}, endpoint_url={}, sink={:?}",
        config.agent_id, config.endpoint_url, config.sink
    );

    // Credentials are handed over once at start and live only in memory.
    // The first cycle doubles as the login check.
    let credentials = CredentialStore::new();
    load_credentials(&credentials);

    let handle = start_agent(&config, credentials.clone())?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutdown requested");
    handle.stop();
    handle.stopped().await;
    credentials.clear();

    info!("Completed {} cycle(s)", handle.state().cycles);

    info!("Spool Agent stopped");
    Ok(())
}

/// Builds the client, sink and session and starts the polling loop
fn start_agent(config: &Config, credentials: CredentialStore) -> Result<SchedulerHandle> {
    // Initialize print server client
    let client = PrintServerClient::with_timeouts(&config.endpoint_url, config.timeouts)
        .context("Failed to create print server client")?
        .with_policy(config.status_policy);

    info!("Print server client initialized");

    let sink = sinks::from_target(&config.sink);
    let session = SessionManager::new(sink, config.bind_timeout);
    let scheduler = PollScheduler::new(Arc::new(client), credentials, session);

    info!("Agent initialized successfully");

    // Start polling loop
    let span = info_span!("agent", id = %config.agent_id);
    Ok(span.in_scope(|| scheduler.start(config.poll_interval)))
}

/// Loads configuration from environment variables with fallback to defaults
fn load_config() -> Result<Config> {
    match Config::from_env() {
        Ok(config) => {
            config.validate()?;
            Ok(config)
        }
        Err(e) => {
            info!("Failed to load config from environment ({}), using defaults", e);
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }
}

/// Populates the credential store from `SPOOL_USERNAME` / `SPOOL_PASSWORD`
///
/// Missing values leave the store unset; every cycle is then skipped until
/// credentials are provided.
fn load_credentials(store: &CredentialStore) {
    match (
        std::env::var("SPOOL_USERNAME"),
        std::env::var("SPOOL_PASSWORD"),
    ) {
        (Ok(username), Ok(password)) => store.set(username, password),
        _ => warn!("SPOOL_USERNAME or SPOOL_PASSWORD not set, cycles will be skipped"),
    }
}
