//! Printer device sink
//!
//! Writes payloads to a device node such as `/dev/usb/lp0`. The node is
//! opened on a background task after `bind`; a failed write is treated as the
//! device going away, so the session drops the binding and rebinds on a later
//! cycle.

use async_trait::async_trait;
use spool_core::{OutputSink, SinkEvents, SinkFault, SinkHandle};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Sink backed by a device node or file
#[derive(Debug)]
pub struct DeviceSink {
    path: PathBuf,
    /// Open in progress, aborted on unbind
    opening: Mutex<Option<JoinHandle<()>>>,
}

impl DeviceSink {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            opening: Mutex::new(None),
        }
    }

    fn abort_opening(&self) {
        if let Ok(mut opening) = self.opening.lock() {
            if let Some(task) = opening.take() {
                task.abort();
            }
        }
    }
}

impl OutputSink for DeviceSink {
    fn bind(&self, events: SinkEvents) -> bool {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("Cannot bind {}: no async runtime", self.path.display());
            return false;
        };

        self.abort_opening();

        let path = self.path.clone();
        let task = runtime.spawn(async move {
            match OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await
            {
                Ok(file) => {
                    debug!("Opened printer device {}", path.display());
                    let handle = DeviceHandle {
                        file: tokio::sync::Mutex::new(file),
                        path,
                        events: events.clone(),
                    };
                    events.connected(Arc::new(handle));
                }
                Err(e) => {
                    warn!("Failed to open printer device {}: {}", path.display(), e);
                    events.disconnected();
                }
            }
        });

        if let Ok(mut opening) = self.opening.lock() {
            *opening = Some(task);
        }
        true
    }

    fn unbind(&self) {
        // The open file is closed when the session drops its handle.
        self.abort_opening();
    }
}

struct DeviceHandle {
    file: tokio::sync::Mutex<File>,
    path: PathBuf,
    events: SinkEvents,
}

#[async_trait]
impl SinkHandle for DeviceHandle {
    async fn emit_text(&self, text: &str) -> Result<(), SinkFault> {
        let mut file = self.file.lock().await;

        let written = match file.write_all(text.as_bytes()).await {
            Ok(()) => file.flush().await,
            Err(e) => Err(e),
        };

        written.map_err(|e| {
            warn!("Write to {} failed: {}", self.path.display(), e);
            self.events.disconnected();
            SinkFault::Device {
                code: e.raw_os_error().unwrap_or(-1),
                message: e.to_string(),
            }
        })
    }
}
