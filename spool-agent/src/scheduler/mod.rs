//! Scheduler layer for the agent
//!
//! This layer runs the poll loop: fetching print payloads from the server on
//! a fixed interval and handing them to the output sink session. It owns the
//! session and is the only place cycles are started.

pub mod poller;

pub use poller::{PollScheduler, SchedulerHandle};
