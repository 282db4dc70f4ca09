use std::sync::{Arc, Mutex};
use std::time::Instant;

use timedag::dag::StepId;
use timedag::report::Reporter;

/// One observed reporter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    Started(StepId),
    Completed(StepId),
    AllDone,
}

/// A reporter that records every call, with the time since it was created.
#[derive(Debug, Clone)]
pub struct RecordingReporter {
    origin: Instant,
    events: Arc<Mutex<Vec<(ReportEvent, u128)>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(e, _)| e.clone())
            .collect()
    }

    /// Completed step ids in completion order.
    pub fn completed(&self) -> Vec<StepId> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::Completed(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Started step ids in start order.
    pub fn started(&self) -> Vec<StepId> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::Started(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Milliseconds since creation at which `event` was first recorded.
    pub fn at_millis(&self, event: &ReportEvent) -> Option<u128> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|(e, _)| e == event)
            .map(|(_, t)| *t)
    }

    fn record(&self, event: ReportEvent) {
        let at = self.origin.elapsed().as_millis();
        self.events.lock().unwrap().push((event, at));
    }
}

impl Default for RecordingReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for RecordingReporter {
    fn step_started(&self, id: StepId, _description: &str) {
        self.record(ReportEvent::Started(id));
    }

    fn step_completed(&self, id: StepId, _description: &str) {
        self.record(ReportEvent::Completed(id));
    }

    fn all_done(&self) {
        self.record(ReportEvent::AllDone);
    }
}
