use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use timedag::dag::StepId;
use timedag::engine::SchedulerContext;
use timedag::errors::{Result, TimedagError};
use timedag::timer::{TimerBackend, TimerHandle, TimerRequest, TokioTimer};

/// A timer backend that:
/// - records every armed request
/// - fires each timer as soon as the Tokio scheduler gets to it,
///   ignoring the requested duration.
#[derive(Debug, Default)]
pub struct InstantTimer {
    next_id: AtomicU64,
    armed: Arc<Mutex<Vec<TimerRequest>>>,
}

impl InstantTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared view of the requests armed so far.
    pub fn armed(&self) -> Arc<Mutex<Vec<TimerRequest>>> {
        Arc::clone(&self.armed)
    }
}

impl TimerBackend for InstantTimer {
    fn arm(&self, request: TimerRequest, on_fire: Arc<SchedulerContext>) -> Result<TimerHandle> {
        self.armed.lock().unwrap().push(request);
        tokio::spawn(async move {
            on_fire.on_timer_fired(request.step).await;
        });
        Ok(TimerHandle::new(self.next_id.fetch_add(1, Ordering::Relaxed)))
    }
}

/// A timer backend whose arming always fails.
#[derive(Debug, Default)]
pub struct FailingTimer;

impl TimerBackend for FailingTimer {
    fn arm(&self, request: TimerRequest, _on_fire: Arc<SchedulerContext>) -> Result<TimerHandle> {
        Err(TimedagError::TimerError(format!(
            "refusing to arm timer for step {}",
            request.step
        )))
    }
}

/// Arms real Tokio timers for every step except `refused`, whose arming
/// fails. Useful for stopping a run while other timers are in flight.
#[derive(Debug)]
pub struct RefusingTimer {
    inner: TokioTimer,
    refused: StepId,
}

impl RefusingTimer {
    pub fn new(refused: StepId) -> Self {
        Self {
            inner: TokioTimer::new(),
            refused,
        }
    }
}

impl TimerBackend for RefusingTimer {
    fn arm(&self, request: TimerRequest, on_fire: Arc<SchedulerContext>) -> Result<TimerHandle> {
        if request.step == self.refused {
            return Err(TimedagError::TimerError(format!(
                "refusing to arm timer for step {}",
                request.step
            )));
        }
        self.inner.arm(request, on_fire)
    }
}
