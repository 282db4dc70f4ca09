// src/engine/removal.rs

//! Dependency-removal worker.
//!
//! Timer completion handlers only record the completed id and raise the
//! removal signal; this worker does the heavier pass over the graph. Signals
//! coalesce, and each pass drains whatever ids are queued at that moment, so
//! a pass triggered by an already-drained completion simply finds nothing.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::engine::context::{PendingCompletions, SchedulerContext};

#[derive(Debug)]
pub struct RemovalWorker {
    ctx: Arc<SchedulerContext>,
    pending: PendingCompletions,
}

impl RemovalWorker {
    pub fn new(ctx: Arc<SchedulerContext>, pending: PendingCompletions) -> Self {
        Self { ctx, pending }
    }

    /// Run the worker on the current Tokio runtime.
    ///
    /// It never finishes on its own; the driver aborts it once the plan is
    /// done.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        debug!("dependency-removal worker started");
        loop {
            self.ctx.wait_for_removal_signal().await;
            self.drain_once().await;
        }
    }

    /// One removal pass. Returns how many completed ids were drained.
    pub async fn drain_once(&mut self) -> usize {
        let drained = self.pending.drain();

        if !drained.is_empty() {
            let mut graph = self.ctx.graph().lock().await;
            for &id in &drained {
                let affected = graph.remove_dependency(id);
                debug!(step = id, affected, "removed completed step from dependency sets");
            }
        }

        self.ctx.notify_progress();
        drained.len()
    }
}
