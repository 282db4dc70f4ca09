// src/config/validate.rs

use std::collections::HashSet;
use std::time::Duration;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{PlanFile, RawPlanFile};
use crate::dag::StepId;
use crate::errors::{Result, TimedagError};
use crate::types::parse_duration;

impl TryFrom<RawPlanFile> for PlanFile {
    type Error = crate::errors::TimedagError;

    fn try_from(raw: RawPlanFile) -> std::result::Result<Self, Self::Error> {
        let time_unit = validate_plan(&raw)?;
        Ok(PlanFile::new_unchecked(raw.config, raw.step, time_unit))
    }
}

/// Check a raw plan. Returns the parsed time unit.
pub fn validate_plan(plan: &RawPlanFile) -> Result<Duration> {
    ensure_has_steps(plan)?;
    let time_unit = validate_global_config(plan)?;
    validate_step_ids(plan)?;
    validate_step_dependencies(plan)?;
    if plan.config.detect_cycles {
        validate_dag(plan)?;
    }
    Ok(time_unit)
}

fn ensure_has_steps(plan: &RawPlanFile) -> Result<()> {
    if plan.step.is_empty() {
        return Err(TimedagError::ConfigError(
            "plan must contain at least one step".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(plan: &RawPlanFile) -> Result<Duration> {
    let unit = parse_duration(&plan.config.time_unit)
        .map_err(|e| TimedagError::ConfigError(format!("[config].time_unit: {e}")))?;

    if unit.is_zero() {
        return Err(TimedagError::ConfigError(
            "[config].time_unit must be greater than zero".to_string(),
        ));
    }

    Ok(unit)
}

fn validate_step_ids(plan: &RawPlanFile) -> Result<()> {
    let mut seen: HashSet<StepId> = HashSet::new();
    for step in &plan.step {
        if !seen.insert(step.id) {
            return Err(TimedagError::DuplicateStep(step.id));
        }
    }
    Ok(())
}

fn validate_step_dependencies(plan: &RawPlanFile) -> Result<()> {
    let ids: HashSet<StepId> = plan.step.iter().map(|s| s.id).collect();

    for step in &plan.step {
        for &dep in &step.after {
            if !ids.contains(&dep) {
                return Err(TimedagError::UnknownDependency {
                    step: step.id,
                    dependency: dep,
                });
            }
        }
    }
    Ok(())
}

fn validate_dag(plan: &RawPlanFile) -> Result<()> {
    // Edge direction: dependency -> dependent.
    let mut graph: DiGraphMap<StepId, ()> = DiGraphMap::new();

    for step in &plan.step {
        graph.add_node(step.id);
    }
    for step in &plan.step {
        for &dep in &step.after {
            if dep == step.id {
                return Err(TimedagError::DagCycle(format!(
                    "step {} depends on itself",
                    step.id
                )));
            }
            graph.add_edge(dep, step.id, ());
        }
    }

    // A topological sort will fail if there is a cycle.
    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(TimedagError::DagCycle(format!(
            "cycle detected in step plan involving step {}",
            cycle.node_id()
        ))),
    }
}
