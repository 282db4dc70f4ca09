// src/dag/graph.rs

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, trace};

use crate::config::model::PlanFile;
use crate::dag::step::{Step, StepId, StepState};
use crate::errors::{Result, TimedagError};
use crate::timer::TimerHandle;

/// Owns every [`Step`] of a plan and tracks their progress.
///
/// Steps keep their declaration order; `index` maps ids to positions.
/// The graph never detects cycles on its own: a cyclic plan simply never
/// yields ready steps for the steps on the cycle.
#[derive(Debug, Clone)]
pub struct StepGraph {
    steps: Vec<Step>,
    index: HashMap<StepId, usize>,
    completed_count: usize,
    /// Ids already passed to `remove_dependency`.
    removed: HashSet<StepId>,
}

impl StepGraph {
    /// Build a graph from fully-populated steps.
    ///
    /// Rejects duplicate ids and dependencies on undeclared steps.
    pub fn new(steps: Vec<Step>) -> Result<Self> {
        let mut index = HashMap::with_capacity(steps.len());
        for (pos, step) in steps.iter().enumerate() {
            if index.insert(step.id, pos).is_some() {
                return Err(TimedagError::DuplicateStep(step.id));
            }
        }

        for step in &steps {
            if let Some(&dependency) = step.dependencies.iter().find(|&&d| !index.contains_key(&d)) {
                return Err(TimedagError::UnknownDependency {
                    step: step.id,
                    dependency,
                });
            }
        }

        Ok(Self {
            steps,
            index,
            completed_count: 0,
            removed: HashSet::new(),
        })
    }

    /// Build a graph from a validated [`PlanFile`].
    pub fn from_plan(plan: &PlanFile) -> Result<Self> {
        Self::new(plan.step.iter().map(Step::from_config).collect())
    }

    /// Total number of steps. Constant after load.
    pub fn count(&self) -> usize {
        self.steps.len()
    }

    pub fn completed_count(&self) -> usize {
        self.completed_count
    }

    /// `true` once every step has completed.
    pub fn is_done(&self) -> bool {
        self.completed_count == self.steps.len()
    }

    pub fn get(&self, id: StepId) -> Option<&Step> {
        self.index.get(&id).map(|&pos| &self.steps[pos])
    }

    pub fn state_of(&self, id: StepId) -> Option<StepState> {
        self.get(id).map(Step::state)
    }

    /// All steps in declaration order.
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }

    /// Steps whose dependency set is empty and that have not been started,
    /// in declaration order.
    pub fn ready_steps(&self) -> Vec<&Step> {
        self.steps.iter().filter(|s| s.is_ready()).collect()
    }

    pub fn running_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.state() == StepState::Running)
            .count()
    }

    /// Remove `completed` from the dependency set of every step.
    ///
    /// Idempotent. Returns how many dependency sets actually changed.
    pub fn remove_dependency(&mut self, completed: StepId) -> usize {
        let mut affected = 0;
        for step in self.steps.iter_mut() {
            if step.dependencies.remove(&completed) {
                affected += 1;
                trace!(step = step.id, dependency = completed, "dependency satisfied");
            }
        }
        self.removed.insert(completed);
        affected
    }

    /// `Ready -> Running`, binding the step's timer.
    pub fn mark_running(&mut self, id: StepId, timer: TimerHandle) -> Result<()> {
        let step = self.get_mut(id)?;
        let from = step.state();
        if from != StepState::Ready {
            return Err(TimedagError::InvalidTransition {
                step: id,
                from,
                to: StepState::Running,
            });
        }

        step.running = true;
        step.timer = Some(timer);
        debug!(step = id, ?timer, "step marked Running");
        Ok(())
    }

    /// `Running -> Completed`, releasing the step's timer and bumping the
    /// completed count.
    pub fn mark_completed(&mut self, id: StepId) -> Result<&Step> {
        let pos = *self.index.get(&id).ok_or(TimedagError::UnknownStep(id))?;
        let step = &mut self.steps[pos];
        let from = step.state();
        if from != StepState::Running {
            return Err(TimedagError::InvalidTransition {
                step: id,
                from,
                to: StepState::Completed,
            });
        }

        step.completed = true;
        step.timer = None;
        self.completed_count += 1;
        debug!(
            step = id,
            completed = self.completed_count,
            total = self.steps.len(),
            "step marked Completed"
        );
        Ok(&self.steps[pos])
    }

    /// No step can ever make progress again: nothing is running or ready,
    /// every completion has already been removed as a dependency, and yet
    /// the plan is not done. Only reachable with a dependency cycle.
    pub fn is_stalled(&self) -> bool {
        if self.is_done() {
            return false;
        }

        self.steps.iter().all(|s| match s.state() {
            StepState::Pending => true,
            StepState::Completed => self.removed.contains(&s.id),
            StepState::Ready | StepState::Running => false,
        })
    }

    /// Steps that still wait on `id`.
    pub fn dependents_of(&self, id: StepId) -> Vec<StepId> {
        self.steps
            .iter()
            .filter(|s| s.dependencies.contains(&id))
            .map(|s| s.id)
            .collect()
    }

    /// Topological order of the outstanding dependency edges.
    ///
    /// Fails with [`TimedagError::DagCycle`] naming one step on a cycle.
    pub fn topological_order(&self) -> Result<Vec<StepId>> {
        // Edge direction: dependency -> dependent.
        let mut graph: DiGraphMap<StepId, ()> = DiGraphMap::new();

        for step in &self.steps {
            graph.add_node(step.id);
        }
        for step in &self.steps {
            for &dep in &step.dependencies {
                graph.add_edge(dep, step.id, ());
            }
        }

        toposort(&graph, None).map_err(|cycle| {
            TimedagError::DagCycle(format!(
                "cycle detected in step graph involving step {}",
                cycle.node_id()
            ))
        })
    }

    fn get_mut(&mut self, id: StepId) -> Result<&mut Step> {
        let pos = *self.index.get(&id).ok_or(TimedagError::UnknownStep(id))?;
        Ok(&mut self.steps[pos])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(n: u64) -> TimerHandle {
        TimerHandle::new(n)
    }

    /// A (no deps), B (after A), C (no deps).
    fn abc() -> StepGraph {
        StepGraph::new(vec![
            Step::new(1, 1, [], "A"),
            Step::new(2, 1, [1], "B"),
            Step::new(3, 2, [], "C"),
        ])
        .unwrap()
    }

    fn ready_ids(graph: &StepGraph) -> Vec<StepId> {
        graph.ready_steps().iter().map(|s| s.id).collect()
    }

    #[test]
    fn ready_steps_are_roots_in_declaration_order() {
        let graph = abc();
        assert_eq!(ready_ids(&graph), vec![1, 3]);
        assert_eq!(graph.count(), 3);
        assert_eq!(graph.completed_count(), 0);
    }

    #[test]
    fn ready_steps_does_not_mutate() {
        let graph = abc();
        let _ = graph.ready_steps();
        assert_eq!(ready_ids(&graph), vec![1, 3]);
        assert_eq!(graph.state_of(1), Some(StepState::Ready));
    }

    #[test]
    fn running_steps_are_not_ready_again() {
        let mut graph = abc();
        graph.mark_running(1, handle(1)).unwrap();
        assert_eq!(ready_ids(&graph), vec![3]);
        assert_eq!(graph.get(1).unwrap().timer, Some(handle(1)));
    }

    #[test]
    fn completion_then_removal_unlocks_dependents() {
        let mut graph = abc();
        graph.mark_running(1, handle(1)).unwrap();
        graph.mark_running(3, handle(2)).unwrap();

        let done = graph.mark_completed(1).unwrap();
        assert_eq!(done.id, 1);
        assert!(done.timer.is_none());
        assert_eq!(graph.completed_count(), 1);

        // Completion alone does not touch dependency sets.
        assert!(ready_ids(&graph).is_empty());

        assert_eq!(graph.remove_dependency(1), 1);
        assert_eq!(ready_ids(&graph), vec![2]);
    }

    #[test]
    fn remove_dependency_is_idempotent() {
        let mut graph = abc();
        assert_eq!(graph.remove_dependency(1), 1);
        let after_first: Vec<_> = graph.steps().map(|s| s.dependencies.clone()).collect();

        assert_eq!(graph.remove_dependency(1), 0);
        let after_second: Vec<_> = graph.steps().map(|s| s.dependencies.clone()).collect();
        assert_eq!(after_first, after_second);
    }

    #[test]
    fn remove_absent_dependency_is_noop() {
        let mut graph = abc();
        assert_eq!(graph.remove_dependency(42), 0);
        assert_eq!(graph.get(2).unwrap().dependencies.len(), 1);
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        let mut graph = abc();

        // Pending step cannot start.
        match graph.mark_running(2, handle(1)) {
            Err(TimedagError::InvalidTransition { step: 2, from, to }) => {
                assert_eq!(from, StepState::Pending);
                assert_eq!(to, StepState::Running);
            }
            other => panic!("expected InvalidTransition, got {other:?}"),
        }

        // Ready step cannot complete without running.
        assert!(matches!(
            graph.mark_completed(1),
            Err(TimedagError::InvalidTransition { step: 1, .. })
        ));

        graph.mark_running(1, handle(1)).unwrap();
        assert!(graph.mark_running(1, handle(2)).is_err());
        graph.mark_completed(1).unwrap();

        // No regression and no double completion.
        assert!(graph.mark_completed(1).is_err());
        assert!(graph.mark_running(1, handle(3)).is_err());
        assert_eq!(graph.completed_count(), 1);
        assert_eq!(graph.state_of(1), Some(StepState::Completed));
    }

    #[test]
    fn unknown_step_is_an_error() {
        let mut graph = abc();
        assert!(matches!(
            graph.mark_running(99, handle(1)),
            Err(TimedagError::UnknownStep(99))
        ));
        assert!(matches!(
            graph.mark_completed(99),
            Err(TimedagError::UnknownStep(99))
        ));
    }

    #[test]
    fn dangling_dependency_is_rejected() {
        let result = StepGraph::new(vec![Step::new(4, 1, [99], "D")]);
        assert!(matches!(
            result,
            Err(TimedagError::UnknownDependency {
                step: 4,
                dependency: 99
            })
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let result = StepGraph::new(vec![Step::new(1, 1, [], "A"), Step::new(1, 2, [], "A2")]);
        assert!(matches!(result, Err(TimedagError::DuplicateStep(1))));
    }

    #[test]
    fn cycle_never_becomes_ready() {
        let mut graph = StepGraph::new(vec![
            Step::new(1, 1, [2], "A"),
            Step::new(2, 1, [1], "B"),
        ])
        .unwrap();

        for _ in 0..100 {
            assert!(graph.ready_steps().is_empty());
            // Removing unrelated ids never unlocks the cycle.
            graph.remove_dependency(7);
        }
        assert!(!graph.is_done());
        assert!(graph.is_stalled());
        assert!(matches!(
            graph.topological_order(),
            Err(TimedagError::DagCycle(_))
        ));
    }

    #[test]
    fn stall_waits_for_pending_removals() {
        let mut graph = StepGraph::new(vec![
            Step::new(1, 1, [], "A"),
            Step::new(2, 1, [1], "B"),
        ])
        .unwrap();

        graph.mark_running(1, handle(1)).unwrap();
        assert!(!graph.is_stalled());

        graph.mark_completed(1).unwrap();
        // Completed but not yet removed as a dependency: not a stall.
        assert!(!graph.is_stalled());

        graph.remove_dependency(1);
        assert!(!graph.is_stalled());
        assert_eq!(ready_ids(&graph), vec![2]);
    }

    #[test]
    fn topological_order_respects_dependencies() {
        let graph = abc();
        let order = graph.topological_order().unwrap();
        let pos = |id| order.iter().position(|&x| x == id).unwrap();
        assert!(pos(1) < pos(2));
        assert_eq!(order.len(), 3);
        assert_eq!(graph.dependents_of(1), vec![2]);
    }
}
