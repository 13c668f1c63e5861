//! Poll schedule domain types

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::fetch::FetchFailure;
use crate::domain::sink::EmitError;

/// Default delay between the end of one cycle and the start of the next
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10_000);

/// Why a cycle ended without emitting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Credentials unset or incomplete; no request was made
    CredentialsMissing,
    /// Payload fetched but the sink was not bound
    SinkNotBound,
    /// Server returned nothing to print
    EmptyPayload,
}

/// What a single cycle did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleOutcome {
    Emitted,
    Skipped(SkipReason),
    FetchFailed(FetchFailure),
    EmitFailed(EmitError),
    /// Fetch completed after stop; result dropped
    Discarded,
}

/// Record of a finished cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    pub finished_at: chrono::DateTime<chrono::Utc>,
}

impl CycleReport {
    pub fn now(outcome: CycleOutcome) -> Self {
        Self {
            outcome,
            finished_at: chrono::Utc::now(),
        }
    }
}

/// Observable state of the poll scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleState {
    pub interval: Duration,
    pub running: bool,
    /// Number of cycles that have finished
    pub cycles: u64,
    pub last: Option<CycleReport>,
}

impl ScheduleState {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            running: true,
            cycles: 0,
            last: None,
        }
    }

    /// Records a finished cycle
    pub fn record(&mut self, report: CycleReport) {
        self.cycles += 1;
        self.last = Some(report);
    }
}
