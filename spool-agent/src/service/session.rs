//! Sink session manager
//!
//! Owns the single binding to the output sink. The sink reports connect and
//! disconnect through a channel; those events are applied here, on the
//! owner's task, whenever the binding is checked or used.
//!
//! States: `Unbound -> Binding -> Bound`, and back to `Unbound` when the sink
//! disconnects or the session is released.

use spool_core::domain::sink::BindingEvent;
use spool_core::{EmitError, OutputSink, SinkEvent, SinkEvents, SinkHandle};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Externally visible binding state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingStatus {
    Unbound,
    Binding,
    Bound,
}

enum BindState {
    Unbound,
    Binding { since: Instant },
    Bound(Arc<dyn SinkHandle>),
}

/// Manages the lifecycle of the output sink binding
///
/// Never waits for the sink to connect: a call made while the sink is still
/// binding or disconnected returns immediately.
pub struct SessionManager {
    sink: Arc<dyn OutputSink>,
    state: BindState,
    /// Bumped on every bind attempt and release; events from older attempts are dropped
    generation: u64,
    bind_timeout: Duration,
    events_tx: mpsc::UnboundedSender<BindingEvent>,
    events_rx: mpsc::UnboundedReceiver<BindingEvent>,
}

impl SessionManager {
    /// Creates an unbound session for the given sink
    ///
    /// # Arguments
    /// * `sink` - The output device adapter
    /// * `bind_timeout` - How long to wait for a connect before retrying the bind
    pub fn new(sink: Arc<dyn OutputSink>, bind_timeout: Duration) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            sink,
            state: BindState::Unbound,
            generation: 0,
            bind_timeout,
            events_tx,
            events_rx,
        }
    }

    /// Current binding state, after applying pending sink events
    pub fn status(&mut self) -> BindingStatus {
        self.apply_pending_events();
        match self.state {
            BindState::Unbound => BindingStatus::Unbound,
            BindState::Binding { .. } => BindingStatus::Binding,
            BindState::Bound(_) => BindingStatus::Bound,
        }
    }

    /// Establishes or confirms the binding
    ///
    /// Starts a bind attempt if unbound (or if the previous attempt has been
    /// pending longer than the bind timeout). Returns whether the sink is
    /// connected right now.
    pub fn ensure_bound(&mut self) -> bool {
        self.apply_pending_events();

        let stuck = match &self.state {
            BindState::Bound(_) => return true,
            BindState::Binding { since } if since.elapsed() < self.bind_timeout => {
                debug!("Sink still binding");
                return false;
            }
            BindState::Binding { .. } => true,
            BindState::Unbound => false,
        };

        if stuck {
            warn!(
                "Sink did not connect within {:?}, retrying bind",
                self.bind_timeout
            );
            self.release();
        }

        self.begin_binding();
        self.apply_pending_events();
        matches!(self.state, BindState::Bound(_))
    }

    /// Sends text to the bound sink
    ///
    /// Fails fast with [`EmitError::NotBound`] when there is no live
    /// binding. Nothing is queued or retried.
    pub async fn emit(&mut self, text: &str) -> Result<(), EmitError> {
        self.apply_pending_events();

        let handle = match &self.state {
            BindState::Bound(handle) => Arc::clone(handle),
            _ => return Err(EmitError::NotBound),
        };

        handle.emit_text(text).await.map_err(EmitError::from)
    }

    /// Releases the binding. Calling it when unbound does nothing.
    pub fn unbind(&mut self) {
        self.apply_pending_events();

        if matches!(self.state, BindState::Unbound) {
            return;
        }

        self.release();
        info!("Sink unbound");
    }

    fn begin_binding(&mut self) {
        self.generation += 1;
        let events = SinkEvents::new(self.generation, self.events_tx.clone());

        if self.sink.bind(events) {
            info!("Binding output sink (attempt {})", self.generation);
            self.state = BindState::Binding {
                since: Instant::now(),
            };
        } else {
            warn!("Failed to bind output sink");
            self.state = BindState::Unbound;
        }
    }

    fn release(&mut self) {
        self.sink.unbind();
        self.generation += 1;
        self.state = BindState::Unbound;
    }

    fn apply_pending_events(&mut self) {
        while let Ok(BindingEvent { generation, event }) = self.events_rx.try_recv() {
            if generation != self.generation {
                debug!("Ignoring {:?} from stale bind attempt {}", event, generation);
                continue;
            }

            match event {
                SinkEvent::Connected(handle) => {
                    info!("Output sink connected");
                    self.state = BindState::Bound(handle);
                }
                SinkEvent::Disconnected => {
                    if !matches!(self.state, BindState::Unbound) {
                        warn!("Output sink disconnected");
                    }
                    self.state = BindState::Unbound;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{BindMode, MockSink};
    use spool_core::SinkFault;

    fn session(sink: &Arc<MockSink>) -> SessionManager {
        SessionManager::new(sink.clone(), Duration::from_secs(30))
    }

    #[tokio::test]
    async fn test_emit_while_unbound_is_not_bound() {
        let sink = MockSink::new(BindMode::Immediate);
        let mut session = session(&sink);

        assert_eq!(session.emit("hello").await, Err(EmitError::NotBound));
        assert_eq!(sink.bind_count(), 0);
        assert!(sink.emitted().is_empty());
    }

    #[tokio::test]
    async fn test_immediate_connect_binds_on_first_call() {
        let sink = MockSink::new(BindMode::Immediate);
        let mut session = session(&sink);

        assert!(session.ensure_bound());
        assert_eq!(session.status(), BindingStatus::Bound);

        session.emit("hello\n").await.unwrap();
        assert_eq!(sink.emitted(), vec!["hello\n".to_string()]);

        // Reuses the existing binding
        assert!(session.ensure_bound());
        assert_eq!(sink.bind_count(), 1);
    }

    #[tokio::test]
    async fn test_emit_fails_fast_while_binding() {
        let sink = MockSink::new(BindMode::Manual);
        let mut session = session(&sink);

        assert!(!session.ensure_bound());
        assert_eq!(session.status(), BindingStatus::Binding);
        assert_eq!(session.emit("early").await, Err(EmitError::NotBound));

        sink.connect();
        assert!(session.ensure_bound());
        session.emit("late").await.unwrap();

        // Nothing from the failed attempt was queued
        assert_eq!(sink.emitted(), vec!["late".to_string()]);
        assert_eq!(sink.bind_count(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_clears_handle_and_rebinds() {
        let sink = MockSink::new(BindMode::Immediate);
        let mut session = session(&sink);

        assert!(session.ensure_bound());
        sink.disconnect();

        assert_eq!(session.status(), BindingStatus::Unbound);
        assert_eq!(session.emit("lost").await, Err(EmitError::NotBound));

        assert!(session.ensure_bound());
        assert_eq!(sink.bind_count(), 2);
    }

    #[tokio::test]
    async fn test_refused_bind_stays_unbound() {
        let sink = MockSink::new(BindMode::Refuse);
        let mut session = session(&sink);

        assert!(!session.ensure_bound());
        assert_eq!(session.status(), BindingStatus::Unbound);
        assert!(!session.ensure_bound());
        assert_eq!(sink.bind_count(), 2);
    }

    #[tokio::test]
    async fn test_device_and_transport_faults_are_reported() {
        let sink = MockSink::new(BindMode::Immediate);
        let mut session = session(&sink);
        assert!(session.ensure_bound());

        sink.fail_next(SinkFault::Device {
            code: 7,
            message: "out of paper".to_string(),
        });
        assert_eq!(
            session.emit("a").await,
            Err(EmitError::Device {
                code: 7,
                message: "out of paper".to_string()
            })
        );

        sink.fail_next(SinkFault::Transport("binder died".to_string()));
        assert_eq!(
            session.emit("b").await,
            Err(EmitError::Transport("binder died".to_string()))
        );

        // Faults do not drop the binding
        session.emit("c").await.unwrap();
        assert_eq!(sink.emitted(), vec!["c".to_string()]);
    }

    #[tokio::test]
    async fn test_unbind_is_idempotent() {
        let sink = MockSink::new(BindMode::Immediate);
        let mut session = session(&sink);

        session.unbind();
        assert_eq!(sink.unbind_count(), 0);

        assert!(session.ensure_bound());
        session.unbind();
        session.unbind();

        assert_eq!(sink.unbind_count(), 1);
        assert_eq!(session.status(), BindingStatus::Unbound);
    }

    #[tokio::test]
    async fn test_stale_events_are_ignored() {
        let sink = MockSink::new(BindMode::Manual);
        let mut session = session(&sink);

        assert!(!session.ensure_bound());
        let stale = sink.last_events().unwrap();

        session.unbind();
        assert!(!session.ensure_bound());

        // A connect from the abandoned attempt must not bind the new one
        stale.connected(sink.handle());
        assert_eq!(session.status(), BindingStatus::Binding);

        sink.connect();
        assert_eq!(session.status(), BindingStatus::Bound);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_binding_is_retried_after_timeout() {
        let sink = MockSink::new(BindMode::Manual);
        let mut session = SessionManager::new(sink.clone(), Duration::from_secs(5));

        assert!(!session.ensure_bound());
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(!session.ensure_bound());
        assert_eq!(sink.bind_count(), 1);

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(!session.ensure_bound());
        assert_eq!(sink.bind_count(), 2);
        assert_eq!(sink.unbind_count(), 1);
    }
}
