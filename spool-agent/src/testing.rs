//! Test doubles for the fetcher and output sink seams

use async_trait::async_trait;
use spool_core::{
    Credentials, FetchResult, Fetcher, OutputSink, SinkEvents, SinkFault, SinkHandle,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::{Duration, Instant};

/// How a [`MockSink`] reacts to `bind`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindMode {
    /// Reports connected from inside `bind`
    Immediate,
    /// Waits for the test to call [`MockSink::connect`]
    Manual,
    /// Reports connected from a spawned task after the given delay
    Deferred(Duration),
    /// Refuses to start binding
    Refuse,
}

#[derive(Default)]
struct Recorded {
    events: Option<SinkEvents>,
    binds: usize,
    unbinds: usize,
    emitted: Vec<String>,
    next_fault: Option<SinkFault>,
}

pub struct MockSink {
    mode: BindMode,
    recorded: Arc<Mutex<Recorded>>,
}

impl MockSink {
    pub fn new(mode: BindMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            recorded: Arc::new(Mutex::new(Recorded::default())),
        })
    }

    pub fn handle(&self) -> Arc<dyn SinkHandle> {
        Arc::new(MockHandle {
            recorded: Arc::clone(&self.recorded),
        })
    }

    pub fn connect(&self) {
        if let Some(events) = self.last_events() {
            events.connected(self.handle());
        }
    }

    pub fn disconnect(&self) {
        if let Some(events) = self.last_events() {
            events.disconnected();
        }
    }

    pub fn last_events(&self) -> Option<SinkEvents> {
        self.recorded.lock().unwrap().events.clone()
    }

    pub fn fail_next(&self, fault: SinkFault) {
        self.recorded.lock().unwrap().next_fault = Some(fault);
    }

    pub fn emitted(&self) -> Vec<String> {
        self.recorded.lock().unwrap().emitted.clone()
    }

    pub fn bind_count(&self) -> usize {
        self.recorded.lock().unwrap().binds
    }

    pub fn unbind_count(&self) -> usize {
        self.recorded.lock().unwrap().unbinds
    }
}

impl OutputSink for MockSink {
    fn bind(&self, events: SinkEvents) -> bool {
        {
            let mut recorded = self.recorded.lock().unwrap();
            recorded.binds += 1;
            if self.mode == BindMode::Refuse {
                return false;
            }
            recorded.events = Some(events.clone());
        }

        match self.mode {
            BindMode::Immediate => events.connected(self.handle()),
            BindMode::Deferred(delay) => {
                let handle = self.handle();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    events.connected(handle);
                });
            }
            BindMode::Manual | BindMode::Refuse => {}
        }
        true
    }

    fn unbind(&self) {
        let mut recorded = self.recorded.lock().unwrap();
        recorded.unbinds += 1;
        recorded.events = None;
    }
}

struct MockHandle {
    recorded: Arc<Mutex<Recorded>>,
}

#[async_trait]
impl SinkHandle for MockHandle {
    async fn emit_text(&self, text: &str) -> Result<(), SinkFault> {
        let mut recorded = self.recorded.lock().unwrap();
        if let Some(fault) = recorded.next_fault.take() {
            return Err(fault);
        }
        recorded.emitted.push(text.to_string());
        Ok(())
    }
}

/// Fetcher that replays scripted results, optionally after a delay
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<FetchResult>>,
    fallback: FetchResult,
    delay: Duration,
    calls: Mutex<Vec<Instant>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedFetcher {
    /// Returns `fallback` once the script is exhausted
    pub fn new(fallback: FetchResult) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn then(self, result: FetchResult) -> Self {
        self.script.lock().unwrap().push_back(result);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Times at which each fetch started
    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, _credentials: &Credentials) -> FetchResult {
        self.calls.lock().unwrap().push(Instant::now());
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}
