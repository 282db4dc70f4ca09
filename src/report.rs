// src/report.rs

//! Human-readable progress output.
//!
//! Reports go to STDOUT; diagnostics from `tracing` go to STDERR.

use std::io::Write;

use tracing::warn;

use crate::dag::StepId;

/// Receives step lifecycle notifications from the scheduler.
///
/// Implementations must be cheap: `step_completed` runs inside the timer
/// completion handler.
pub trait Reporter: Send + Sync {
    fn step_started(&self, _id: StepId, _description: &str) {}

    fn step_completed(&self, id: StepId, description: &str);

    /// Called once, after every step has completed.
    fn all_done(&self);
}

/// Prints completion notices and the final message to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }

    fn emit(&self, line: std::fmt::Arguments<'_>) {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        if let Err(e) = writeln!(out, "{line}").and_then(|_| out.flush()) {
            warn!(error = %e, "failed to write report to stdout");
        }
    }
}

impl Reporter for ConsoleReporter {
    fn step_completed(&self, id: StepId, description: &str) {
        self.emit(format_args!("{}", completion_line(id, description)));
    }

    fn all_done(&self) {
        self.emit(format_args!("Enjoy!"));
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn step_completed(&self, _id: StepId, _description: &str) {}

    fn all_done(&self) {}
}

pub fn completion_line(id: StepId, description: &str) -> String {
    if description.is_empty() {
        format!("Step {id} completed")
    } else {
        format!("Step {id} completed: {description}")
    }
}
