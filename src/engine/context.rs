// src/engine/context.rs

//! Shared scheduler state.
//!
//! One [`SchedulerContext`] is created per plan run and shared (behind an
//! `Arc`) by the driver, the removal worker and every armed timer. It owns:
//! - the [`StepGraph`]
//! - the pending-completion queue (ids waiting for dependency removal)
//! - the removal signal (timer handlers -> removal worker)
//! - the progress signal (handlers / worker -> driver)

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, Notify, mpsc};
use tracing::{debug, error, info, warn};

use crate::dag::{StepGraph, StepId, StepState};
use crate::errors::TimedagError;
use crate::report::Reporter;

/// Receiving end of the pending-completion queue.
///
/// Owned by exactly one removal worker.
#[derive(Debug)]
pub struct PendingCompletions {
    rx: mpsc::UnboundedReceiver<StepId>,
}

impl PendingCompletions {
    /// Take every id recorded so far without waiting.
    pub fn drain(&mut self) -> Vec<StepId> {
        let mut drained = Vec::new();
        while let Ok(id) = self.rx.try_recv() {
            drained.push(id);
        }
        drained
    }
}

pub struct SchedulerContext {
    graph: Mutex<StepGraph>,
    pending_tx: mpsc::UnboundedSender<StepId>,
    removal_signal: Notify,
    progress: Notify,
    reporter: Arc<dyn Reporter>,
    /// First error raised inside a completion handler, surfaced by the driver.
    fault: Mutex<Option<TimedagError>>,
    /// Set once the driver has stopped; written under the graph lock.
    closed: AtomicBool,
}

impl fmt::Debug for SchedulerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerContext")
            .field("graph", &self.graph)
            .finish_non_exhaustive()
    }
}

impl SchedulerContext {
    pub fn new(graph: StepGraph, reporter: Arc<dyn Reporter>) -> (Arc<Self>, PendingCompletions) {
        let (pending_tx, rx) = mpsc::unbounded_channel();
        let ctx = Arc::new(Self {
            graph: Mutex::new(graph),
            pending_tx,
            removal_signal: Notify::new(),
            progress: Notify::new(),
            reporter,
            fault: Mutex::new(None),
            closed: AtomicBool::new(false),
        });
        (ctx, PendingCompletions { rx })
    }

    pub fn graph(&self) -> &Mutex<StepGraph> {
        &self.graph
    }

    pub fn reporter(&self) -> &dyn Reporter {
        self.reporter.as_ref()
    }

    /// Clone of the current graph state, for diagnostics and tests.
    pub async fn snapshot(&self) -> StepGraph {
        self.graph.lock().await.clone()
    }

    /// Completion notification for a fired timer.
    ///
    /// Order matters: the id is recorded in the pending queue before the
    /// completed count moves and before the removal worker is signalled, so
    /// a removal pass can never miss it. Both happen under the graph lock,
    /// so a removal pass cannot apply the id while the step is still running.
    /// Completions arriving after [`close`](Self::close) are dropped.
    pub async fn on_timer_fired(&self, id: StepId) {
        let completed = {
            let mut graph = self.graph.lock().await;
            if self.closed.load(Ordering::Acquire) {
                debug!(step = id, "run already stopped; completion ignored");
                return;
            }
            if graph.state_of(id) == Some(StepState::Running) && self.pending_tx.send(id).is_err() {
                warn!(step = id, "pending-completion queue closed; dependency removal skipped");
            }
            let completed = graph.mark_completed(id).map(|step| step.description.clone());
            if let Ok(description) = &completed {
                info!(step = id, "step completed");
                self.reporter.step_completed(id, description);
            }
            completed
        };

        if let Err(e) = completed {
            error!(step = id, error = %e, "completion for step that is not running");
            self.record_fault(e).await;
            return;
        }

        self.removal_signal.notify_one();
        self.progress.notify_one();
    }

    /// Stop accepting completions. Timers still in flight when the run
    /// stops early fire into a closed context and report nothing.
    pub async fn close(&self) {
        let _graph = self.graph.lock().await;
        self.closed.store(true, Ordering::Release);
    }

    /// Wait until a handler or the removal worker reports progress.
    ///
    /// A notification raised while nobody waits is kept, so the driver never
    /// misses a wake-up between checking the graph and calling this.
    pub async fn wait_for_progress(&self) {
        self.progress.notified().await;
    }

    pub(crate) fn notify_progress(&self) {
        self.progress.notify_one();
    }

    pub(crate) async fn wait_for_removal_signal(&self) {
        self.removal_signal.notified().await;
    }

    pub(crate) async fn take_fault(&self) -> Option<TimedagError> {
        self.fault.lock().await.take()
    }

    async fn record_fault(&self, err: TimedagError) {
        let mut fault = self.fault.lock().await;
        if fault.is_none() {
            *fault = Some(err);
        }
        drop(fault);
        self.progress.notify_one();
    }
}
