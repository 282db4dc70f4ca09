// src/dag/step.rs

//! A single timed step and its lifecycle state.

use std::collections::BTreeSet;

use crate::config::model::StepConfig;
use crate::timer::TimerHandle;

/// Canonical step identifier type used throughout the crate.
pub type StepId = u32;

/// Lifecycle of a step.
///
/// A step only ever moves forward through these states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StepState {
    /// Waiting on at least one dependency.
    Pending,
    /// All dependencies completed; not started yet.
    Ready,
    /// Timer armed.
    Running,
    /// Timer fired.
    Completed,
}

/// A schedulable unit of work with a fixed duration.
#[derive(Debug, Clone)]
pub struct Step {
    pub id: StepId,
    /// Number of time units the step runs for.
    pub duration: u64,
    /// Outstanding prerequisites. Ids are removed as they complete.
    pub dependencies: BTreeSet<StepId>,
    pub description: String,
    pub running: bool,
    pub completed: bool,
    /// Timer bound to the step while it is running.
    pub timer: Option<TimerHandle>,
}

impl Step {
    pub fn new(
        id: StepId,
        duration: u64,
        dependencies: impl IntoIterator<Item = StepId>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            duration,
            dependencies: dependencies.into_iter().collect(),
            description: description.into(),
            running: false,
            completed: false,
            timer: None,
        }
    }

    pub fn from_config(cfg: &StepConfig) -> Self {
        Self::new(
            cfg.id,
            cfg.duration,
            cfg.after.iter().copied(),
            cfg.description.clone(),
        )
    }

    /// Eligible to start: no outstanding dependencies and never started.
    pub fn is_ready(&self) -> bool {
        self.dependencies.is_empty() && !self.running
    }

    pub fn state(&self) -> StepState {
        if self.completed {
            StepState::Completed
        } else if self.running {
            StepState::Running
        } else if self.dependencies.is_empty() {
            StepState::Ready
        } else {
            StepState::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_follows_flags() {
        let mut step = Step::new(1, 3, [2], "Boil water");
        assert_eq!(step.state(), StepState::Pending);
        assert!(!step.is_ready());

        step.dependencies.clear();
        assert_eq!(step.state(), StepState::Ready);
        assert!(step.is_ready());

        step.running = true;
        assert_eq!(step.state(), StepState::Running);
        assert!(!step.is_ready());

        step.completed = true;
        assert_eq!(step.state(), StepState::Completed);
    }

    #[test]
    fn duplicate_declared_dependencies_collapse() {
        let step = Step::new(3, 1, [1, 2, 1], "Mix");
        assert_eq!(step.dependencies.len(), 2);
    }
}
