//! Core domain types
//!
//! This module contains the structures shared between the HTTP client (which
//! produces fetch outcomes) and the agent (which schedules cycles and drives
//! the output sink).

pub mod credentials;
pub mod fetch;
pub mod schedule;
pub mod sink;
