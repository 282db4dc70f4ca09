// src/engine/mod.rs

//! Execution engine for timedag.
//!
//! This module ties together:
//! - the shared [`SchedulerContext`] (graph, pending completions, signals)
//! - the [`Driver`] control loop that starts ready steps
//! - the [`RemovalWorker`] that turns completions into satisfied
//!   dependencies
//!
//! Timer expiry flows as: timer task -> `SchedulerContext::on_timer_fired`
//! -> pending queue + removal signal -> `RemovalWorker` -> progress signal
//! -> `Driver`.

pub mod context;
pub mod driver;
pub mod removal;

pub use context::{PendingCompletions, SchedulerContext};
pub use driver::{Driver, DriverOptions, RunSummary};
pub use removal::RemovalWorker;
