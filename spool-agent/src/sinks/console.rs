//! Standard output sink

use async_trait::async_trait;
use spool_core::{OutputSink, SinkEvents, SinkFault, SinkHandle};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

/// Sink that writes payloads to standard output
///
/// Connects as soon as it is bound and never disconnects.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

impl OutputSink for ConsoleSink {
    fn bind(&self, events: SinkEvents) -> bool {
        events.connected(Arc::new(ConsoleHandle));
        true
    }

    fn unbind(&self) {}
}

struct ConsoleHandle;

#[async_trait]
impl SinkHandle for ConsoleHandle {
    async fn emit_text(&self, text: &str) -> Result<(), SinkFault> {
        let mut out = tokio::io::stdout();
        out.write_all(text.as_bytes())
            .await
            .map_err(|e| SinkFault::Transport(e.to_string()))?;
        out.flush()
            .await
            .map_err(|e| SinkFault::Transport(e.to_string()))
    }
}
