// src/engine/driver.rs

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::dag::{StepGraph, StepId};
use crate::engine::context::{PendingCompletions, SchedulerContext};
use crate::engine::removal::RemovalWorker;
use crate::errors::{Result, TimedagError};
use crate::report::Reporter;
use crate::timer::{TimerBackend, TimerRequest};

/// Options controlling a single plan run.
#[derive(Debug, Clone, Copy)]
pub struct DriverOptions {
    /// Wall-clock length of one duration unit.
    pub time_unit: Duration,
    /// Return [`TimedagError::Stalled`] instead of waiting forever when no
    /// step can ever become ready again.
    pub fail_on_stall: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            time_unit: Duration::from_secs(1),
            fail_on_stall: false,
        }
    }
}

/// What a finished run looked like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub total: usize,
    /// Number of times the control loop woke up.
    pub wakeups: u64,
    pub elapsed: Duration,
}

/// Control loop of the scheduler.
///
/// Each iteration starts every ready step (one armed timer per step), then
/// parks until a completion or a removal pass reports progress. Steps are
/// armed and marked running under the same graph lock, so a completion can
/// never be observed for a step that is not yet marked running.
pub struct Driver<T: TimerBackend> {
    ctx: Arc<SchedulerContext>,
    pending: PendingCompletions,
    timers: T,
    options: DriverOptions,
}

impl<T: TimerBackend> fmt::Debug for Driver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("ctx", &self.ctx)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<T: TimerBackend> Driver<T> {
    pub fn new(
        graph: StepGraph,
        reporter: Arc<dyn Reporter>,
        timers: T,
        options: DriverOptions,
    ) -> Self {
        let (ctx, pending) = SchedulerContext::new(graph, reporter);
        Self {
            ctx,
            pending,
            timers,
            options,
        }
    }

    /// Shared context, e.g. to inspect the graph while the run is in flight.
    pub fn context(&self) -> Arc<SchedulerContext> {
        Arc::clone(&self.ctx)
    }

    /// Run the plan to completion.
    ///
    /// Spawns the dependency-removal worker for the duration of the run.
    /// On return the context is closed: timers still armed after an early
    /// error may fire, but they no longer complete or report anything.
    pub async fn run(self) -> Result<RunSummary> {
        let Self {
            ctx,
            pending,
            timers,
            options,
        } = self;

        info!(
            time_unit = ?options.time_unit,
            fail_on_stall = options.fail_on_stall,
            "driver started"
        );

        let worker = RemovalWorker::new(Arc::clone(&ctx), pending).spawn();
        let result = drive(&ctx, &timers, &options).await;
        ctx.close().await;
        worker.abort();

        match &result {
            Ok(summary) => {
                info!(
                    completed = summary.completed,
                    wakeups = summary.wakeups,
                    elapsed = ?summary.elapsed,
                    "all steps completed"
                );
                ctx.reporter().all_done();
            }
            Err(e) => warn!(error = %e, "driver stopped before all steps completed"),
        }

        result
    }
}

async fn drive<T: TimerBackend>(
    ctx: &Arc<SchedulerContext>,
    timers: &T,
    options: &DriverOptions,
) -> Result<RunSummary> {
    let started = Instant::now();
    let mut wakeups = 0u64;
    let mut stall_reported = false;

    loop {
        if let Some(fault) = ctx.take_fault().await {
            return Err(fault);
        }

        {
            let mut graph = ctx.graph().lock().await;

            if graph.is_done() {
                return Ok(RunSummary {
                    completed: graph.completed_count(),
                    total: graph.count(),
                    wakeups,
                    elapsed: started.elapsed(),
                });
            }

            let started_now = start_ready_steps(ctx, &mut graph, timers, options)?;
            if started_now > 0 {
                debug!(
                    started = started_now,
                    running = graph.running_count(),
                    completed = graph.completed_count(),
                    total = graph.count(),
                    "started ready steps"
                );
            }

            if graph.is_stalled() {
                if options.fail_on_stall {
                    return Err(TimedagError::Stalled {
                        completed: graph.completed_count(),
                        total: graph.count(),
                    });
                }
                if !stall_reported {
                    warn!(
                        completed = graph.completed_count(),
                        total = graph.count(),
                        "no step can become ready; dependency cycle? waiting forever"
                    );
                    stall_reported = true;
                }
            }
        }

        ctx.wait_for_progress().await;
        wakeups += 1;
    }
}

/// Arm a timer for every ready step and mark it running.
fn start_ready_steps<T: TimerBackend>(
    ctx: &Arc<SchedulerContext>,
    graph: &mut StepGraph,
    timers: &T,
    options: &DriverOptions,
) -> Result<usize> {
    let ready: Vec<(StepId, u64, String)> = graph
        .ready_steps()
        .into_iter()
        .map(|s| (s.id, s.duration, s.description.clone()))
        .collect();

    for (id, duration, description) in &ready {
        let request = TimerRequest::scaled(*id, *duration, options.time_unit)?;
        let handle = timers.arm(request, Arc::clone(ctx))?;
        graph.mark_running(*id, handle)?;

        info!(step = id, duration, %handle, "starting step");
        ctx.reporter().step_started(*id, description);
    }

    Ok(ready.len())
}
