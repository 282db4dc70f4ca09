// src/timer.rs

//! One-shot step timers.
//!
//! The driver talks to a [`TimerBackend`] instead of spawning sleeps
//! directly, so tests can swap in timers that fire instantly, record what
//! was armed, or refuse to arm at all.
//!
//! - [`TokioTimer`] is the production backend: one Tokio task per armed
//!   timer, sleeping for the requested duration and then delivering the
//!   completion to the [`SchedulerContext`].

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::{debug, trace};

use crate::dag::StepId;
use crate::engine::SchedulerContext;
use crate::errors::{Result, TimedagError};

/// Opaque identifier of an armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// What to arm: which step, and when it should fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerRequest {
    pub step: StepId,
    pub after: Duration,
}

impl TimerRequest {
    /// Scale a step duration by the plan's time unit.
    ///
    /// Overflowing the representable range is a timer error: a step whose
    /// timer cannot be armed would never complete.
    pub fn scaled(step: StepId, duration: u64, time_unit: Duration) -> Result<Self> {
        let after = u32::try_from(duration)
            .ok()
            .and_then(|units| time_unit.checked_mul(units))
            .ok_or_else(|| {
                TimedagError::TimerError(format!(
                    "step {step}: duration {duration} x {time_unit:?} is out of range"
                ))
            })?;

        Ok(Self { step, after })
    }
}

/// Trait abstracting how step timers are armed.
///
/// Arming is synchronous so the driver can arm a timer and bind its handle
/// to the step under a single graph lock. When the timer fires, the
/// implementation must call [`SchedulerContext::on_timer_fired`] exactly
/// once with the step id.
pub trait TimerBackend: Send + Sync {
    fn arm(&self, request: TimerRequest, on_fire: Arc<SchedulerContext>) -> Result<TimerHandle>;
}

/// Production timer backend built on `tokio::time::sleep`.
#[derive(Debug, Default)]
pub struct TokioTimer {
    next_id: AtomicU64,
}

impl TokioTimer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimerBackend for TokioTimer {
    fn arm(&self, request: TimerRequest, on_fire: Arc<SchedulerContext>) -> Result<TimerHandle> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TimedagError::TimerError(format!("no Tokio runtime to arm timer: {e}")))?;

        let handle = TimerHandle::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(step = request.step, %handle, after = ?request.after, "arming timer");

        runtime.spawn(async move {
            tokio::time::sleep(request.after).await;
            trace!(step = request.step, %handle, "timer fired");
            on_fire.on_timer_fired(request.step).await;
        });

        Ok(handle)
    }
}
