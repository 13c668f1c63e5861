//! Output sink capability
//!
//! The physical printer is reached through an adapter implementing
//! [`OutputSink`]. Binding is asynchronous: `bind` only starts the attempt,
//! and the adapter later reports `connected`/`disconnected` through the
//! [`SinkEvents`] it was given. The core never assumes a synchronous connect.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Live connection to the device, handed over on connect
#[async_trait]
pub trait SinkHandle: Send + Sync {
    /// Sends text to the device
    async fn emit_text(&self, text: &str) -> Result<(), SinkFault>;
}

/// Adapter for a single output device
pub trait OutputSink: Send + Sync {
    /// Starts binding to the device
    ///
    /// Must not block. Returns `false` if the attempt could not be started
    /// at all; connect/disconnect are otherwise reported through `events`.
    fn bind(&self, events: SinkEvents) -> bool;

    /// Releases the device. Safe to call when not bound.
    fn unbind(&self);
}

/// Error reported by a device adapter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkFault {
    /// The device rejected the job
    #[error("device error {code}: {message}")]
    Device { code: i32, message: String },

    /// The call into the device binding itself failed
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Why an emit through the session did not reach the device
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum EmitError {
    #[error("sink not bound")]
    NotBound,

    #[error("device error {code}: {message}")]
    Device { code: i32, message: String },

    #[error("sink transport failure: {0}")]
    Transport(String),
}

impl From<SinkFault> for EmitError {
    fn from(fault: SinkFault) -> Self {
        match fault {
            SinkFault::Device { code, message } => Self::Device { code, message },
            SinkFault::Transport(message) => Self::Transport(message),
        }
    }
}

/// Connection state change reported by an adapter
#[derive(Clone)]
pub enum SinkEvent {
    Connected(Arc<dyn SinkHandle>),
    Disconnected,
}

impl fmt::Debug for SinkEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected(_) => f.write_str("Connected"),
            Self::Disconnected => f.write_str("Disconnected"),
        }
    }
}

/// Event tagged with the bind attempt it belongs to
#[derive(Debug, Clone)]
pub struct BindingEvent {
    pub generation: u64,
    pub event: SinkEvent,
}

/// Callback channel given to [`OutputSink::bind`]
///
/// Events are posted to the owner of the binding and applied there, so
/// adapters may call these from any thread or task.
#[derive(Debug, Clone)]
pub struct SinkEvents {
    generation: u64,
    tx: mpsc::UnboundedSender<BindingEvent>,
}

impl SinkEvents {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<BindingEvent>) -> Self {
        Self { generation, tx }
    }

    /// Bind attempt these events belong to
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Reports that the device is ready
    pub fn connected(&self, handle: Arc<dyn SinkHandle>) {
        self.post(SinkEvent::Connected(handle));
    }

    /// Reports that the device went away
    pub fn disconnected(&self) {
        self.post(SinkEvent::Disconnected);
    }

    fn post(&self, event: SinkEvent) {
        // A closed channel means the session is gone; nothing left to notify.
        let _ = self.tx.send(BindingEvent {
            generation: self.generation,
            event,
        });
    }
}
