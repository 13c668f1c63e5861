//! Spool Core
//!
//! Core types and abstractions for the spool print agent.
//!
//! This crate contains:
//! - Domain types: credentials, fetch outcomes, schedule state
//! - Capability traits: [`Fetcher`] for the remote print endpoint,
//!   [`OutputSink`] and [`SinkHandle`] for the output device

pub mod domain;

pub use domain::credentials::Credentials;
pub use domain::fetch::{FetchFailure, FetchResult, Fetcher, StatusPolicy};
pub use domain::schedule::{CycleOutcome, CycleReport, ScheduleState, SkipReason};
pub use domain::sink::{EmitError, OutputSink, SinkEvent, SinkEvents, SinkFault, SinkHandle};
