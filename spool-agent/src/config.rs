//! Agent configuration
//!
//! Defines all configurable parameters for the agent including the print
//! endpoint, polling interval, request timeouts and the output sink.

use spool_client::FetchTimeouts;
use spool_core::StatusPolicy;
use spool_core::domain::schedule::DEFAULT_POLL_INTERVAL;
use std::path::PathBuf;
use std::time::Duration;

/// Where printed payloads go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkTarget {
    /// Write to standard output
    Stdout,
    /// Write to a printer device node or file (e.g., /dev/usb/lp0)
    Device(PathBuf),
}

impl SinkTarget {
    /// Parses the `SINK` environment value
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "stdout" | "-" => Self::Stdout,
            path => Self::Device(PathBuf::from(path)),
        }
    }
}

/// Agent configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Identifier for this agent instance, attached to log output
    pub agent_id: String,

    /// Full URL of the print endpoint (e.g., "https://host/what_to_print")
    pub endpoint_url: String,

    /// Delay between the end of one cycle and the start of the next
    pub poll_interval: Duration,

    /// Connect and read timeouts for each fetch
    pub timeouts: FetchTimeouts,

    /// How long a sink may stay in the binding state before retrying
    pub bind_timeout: Duration,

    /// Which response statuses count as success
    pub status_policy: StatusPolicy,

    /// Output device
    pub sink: SinkTarget,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(agent_id: String, endpoint_url: String) -> Self {
        Self {
            agent_id,
            endpoint_url,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeouts: FetchTimeouts::default(),
            bind_timeout: Duration::from_secs(30),
            status_policy: StatusPolicy::default(),
            sink: SinkTarget::Stdout,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - ENDPOINT_URL (required)
    /// - AGENT_ID (optional, default: random UUID)
    /// - POLL_INTERVAL_MS (optional, default: 10000)
    /// - CONNECT_TIMEOUT_MS (optional, default: 5000)
    /// - READ_TIMEOUT_MS (optional, default: 5000)
    /// - BIND_TIMEOUT (optional, seconds, default: 30)
    /// - STATUS_POLICY (optional, `reject-<code>` or `require-2xx`, default: reject-400)
    /// - SINK (optional, `stdout` or a device path, default: stdout)
    pub fn from_env() -> anyhow::Result<Self> {
        let endpoint_url = std::env::var("ENDPOINT_URL")
            .map_err(|_| anyhow::anyhow!("ENDPOINT_URL environment variable not set"))?;

        let agent_id = std::env::var("AGENT_ID")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let mut config = Self::new(agent_id, endpoint_url);

        if let Some(interval) = env_millis("POLL_INTERVAL_MS") {
            config.poll_interval = interval;
        }

        if let Some(connect) = env_millis("CONNECT_TIMEOUT_MS") {
            config.timeouts.connect = connect;
        }

        if let Some(read) = env_millis("READ_TIMEOUT_MS") {
            config.timeouts.read = read;
        }

        if let Some(secs) = std::env::var("BIND_TIMEOUT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.bind_timeout = Duration::from_secs(secs);
        }

        if let Ok(value) = std::env::var("STATUS_POLICY") {
            config.status_policy = StatusPolicy::parse(&value)
                .ok_or_else(|| anyhow::anyhow!("Invalid STATUS_POLICY: {}", value))?;
        }

        if let Ok(value) = std::env::var("SINK") {
            config.sink = SinkTarget::parse(&value);
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.agent_id.is_empty() {
            anyhow::bail!("agent_id cannot be empty");
        }

        if self.endpoint_url.is_empty() {
            anyhow::bail!("endpoint_url cannot be empty");
        }

        if !self.endpoint_url.starts_with("http://") && !self.endpoint_url.starts_with("https://")
        {
            anyhow::bail!("endpoint_url must start with http:// or https://");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.timeouts.connect.is_zero() || self.timeouts.read.is_zero() {
            anyhow::bail!("connect and read timeouts must be greater than 0");
        }

        if self.bind_timeout.is_zero() {
            anyhow::bail!("bind_timeout must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            uuid::Uuid::new_v4().to_string(),
            "https://localhost:8443/what_to_print".to_string(),
        )
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}
