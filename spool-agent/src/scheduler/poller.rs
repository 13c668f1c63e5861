//! Poll scheduler
//!
//! Runs one fetch-then-emit cycle at a time. The next cycle starts a fixed
//! interval after the previous one has been fully handled, so a slow server
//! delays the schedule instead of stacking requests. The fetch itself runs on
//! a spawned task and its result is handed back to the loop before any
//! session state is touched.

use spool_core::{
    CycleOutcome, CycleReport, FetchFailure, Fetcher, ScheduleState, SkipReason,
};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{self, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, warn};

use crate::service::{CredentialStore, SessionManager};

/// Poll loop that owns the sink session
pub struct PollScheduler {
    fetcher: Arc<dyn Fetcher>,
    credentials: CredentialStore,
    session: SessionManager,
}

/// Control handle for a running scheduler
///
/// Cheap to clone; `stop` may be called from any task or thread, any
/// number of times.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    cancel: CancellationToken,
    state: watch::Receiver<ScheduleState>,
}

impl PollScheduler {
    /// Creates a new poll scheduler
    ///
    /// # Arguments
    /// * `fetcher` - Source of print payloads
    /// * `credentials` - Credential store read at the start of every cycle
    /// * `session` - Output sink session, owned by the loop from now on
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        credentials: CredentialStore,
        session: SessionManager,
    ) -> Self {
        Self {
            fetcher,
            credentials,
            session,
        }
    }

    /// Starts the polling loop on the current runtime
    ///
    /// The first cycle runs immediately. Every cycle requests the output
    /// sink binding before it fetches, so the sink can connect while the
    /// fetch is in flight.
    pub fn start(self, interval: Duration) -> SchedulerHandle {
        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(ScheduleState::new(interval));

        tokio::spawn(
            self.run(interval, cancel.clone(), state_tx)
                .in_current_span(),
        );

        SchedulerHandle {
            cancel,
            state: state_rx,
        }
    }

    async fn run(
        mut self,
        interval: Duration,
        cancel: CancellationToken,
        state: watch::Sender<ScheduleState>,
    ) {
        info!("Starting poll scheduler (interval: {:?})", interval);

        loop {
            let outcome = self.run_cycle(&cancel).await;
            log_outcome(&outcome);
            state.send_modify(|s| s.record(CycleReport::now(outcome)));

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = time::sleep(interval) => {}
            }
        }

        self.session.unbind();
        state.send_modify(|s| s.running = false);
        info!("Poll scheduler stopped");
    }

    /// Performs a single cycle
    async fn run_cycle(&mut self, cancel: &CancellationToken) -> CycleOutcome {
        // Request the binding before fetching so a sink that connects
        // asynchronously has the whole fetch to do so.
        self.session.ensure_bound();

        let Some(credentials) = self.credentials.get().filter(|c| c.is_complete()) else {
            return CycleOutcome::Skipped(SkipReason::CredentialsMissing);
        };

        debug!("Polling print server");

        let fetcher = Arc::clone(&self.fetcher);
        let fetch = tokio::spawn(
            async move { fetcher.fetch(&credentials).await }.in_current_span(),
        );

        // The fetch is not interrupted on stop; its result is simply dropped.
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return CycleOutcome::Discarded,
            joined = fetch => joined.unwrap_or_else(|e| {
                error!("Fetch task failed: {}", e);
                Err(FetchFailure::Network)
            }),
        };

        if cancel.is_cancelled() {
            return CycleOutcome::Discarded;
        }

        let payload = match result {
            Ok(payload) => payload,
            Err(failure) => return CycleOutcome::FetchFailed(failure),
        };

        if payload.is_empty() {
            return CycleOutcome::Skipped(SkipReason::EmptyPayload);
        }

        if !self.session.ensure_bound() {
            debug!("Sink is {:?}", self.session.status());
            return CycleOutcome::Skipped(SkipReason::SinkNotBound);
        }

        match self.session.emit(&payload).await {
            Ok(()) => CycleOutcome::Emitted,
            Err(e) => CycleOutcome::EmitFailed(e),
        }
    }
}

impl SchedulerHandle {
    /// Stops the loop
    ///
    /// Cancels the pending timer; the loop then releases the sink binding
    /// and exits. A fetch already in flight is left to finish and its
    /// result is discarded.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            info!("Stopping poll scheduler");
            self.cancel.cancel();
        }
    }

    /// Waits until the loop has exited and released the sink
    pub async fn stopped(&self) {
        let mut state = self.state.clone();
        // An error means the loop is gone, which is what we wait for anyway.
        let _ = state.wait_for(|s| !s.running).await;
    }

    /// Snapshot of the scheduler state
    pub fn state(&self) -> ScheduleState {
        self.state.borrow().clone()
    }

    /// Receiver notified after every cycle and on stop
    #[allow(dead_code)]
    pub fn subscribe(&self) -> watch::Receiver<ScheduleState> {
        self.state.clone()
    }
}

fn log_outcome(outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::Emitted => info!("Payload sent to output sink"),
        CycleOutcome::Skipped(SkipReason::CredentialsMissing) => {
            warn!("Username or password is empty, skipping cycle")
        }
        CycleOutcome::Skipped(SkipReason::SinkNotBound) => {
            warn!("Output sink not bound, payload dropped")
        }
        CycleOutcome::Skipped(SkipReason::EmptyPayload) => debug!("Nothing to print"),
        CycleOutcome::FetchFailed(FetchFailure::AuthRejected) => {
            error!("Server rejected credentials")
        }
        CycleOutcome::FetchFailed(failure) => warn!("Fetch failed: {}", failure),
        CycleOutcome::EmitFailed(e) => error!("Failed to print payload: {}", e),
        CycleOutcome::Discarded => debug!("Scheduler stopped, fetch result discarded"),
    }
}
