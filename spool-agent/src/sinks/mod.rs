//! Concrete implementations of OutputSink for the agent
//!
//! The vendor printer binding lives outside this crate; these adapters cover
//! the devices the agent can drive on its own: standard output and a printer
//! device node (or plain file).

mod console;
mod device;

pub use console::ConsoleSink;
pub use device::DeviceSink;

use spool_core::OutputSink;
use std::sync::Arc;

use crate::config::SinkTarget;

/// Builds the sink adapter for a configured target
pub fn from_target(target: &SinkTarget) -> Arc<dyn OutputSink> {
    match target {
        SinkTarget::Stdout => Arc::new(ConsoleSink::new()),
        SinkTarget::Device(path) => Arc::new(DeviceSink::new(path.clone())),
    }
}
