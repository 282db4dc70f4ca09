#![allow(dead_code)]

use timedag::config::{ConfigSection, PlanFile, RawPlanFile, StepConfig};
use timedag::dag::{StepGraph, StepId};

/// Builder for `PlanFile` to simplify test setup.
pub struct PlanFileBuilder {
    plan: RawPlanFile,
}

impl PlanFileBuilder {
    pub fn new() -> Self {
        Self {
            plan: RawPlanFile {
                config: ConfigSection::default(),
                step: Vec::new(),
            },
        }
    }

    pub fn with_step(mut self, step: StepConfig) -> Self {
        self.plan.step.push(step);
        self
    }

    pub fn time_unit(mut self, unit: &str) -> Self {
        self.plan.config.time_unit = unit.to_string();
        self
    }

    pub fn detect_cycles(mut self, val: bool) -> Self {
        self.plan.config.detect_cycles = val;
        self
    }

    /// The unvalidated plan, for tests that exercise validation errors.
    pub fn build_raw(self) -> RawPlanFile {
        self.plan
    }

    pub fn build(self) -> PlanFile {
        PlanFile::try_from(self.plan).expect("Failed to build valid plan from builder")
    }

    /// Build the plan and turn it straight into a `StepGraph`.
    pub fn build_graph(self) -> StepGraph {
        StepGraph::from_plan(&self.build()).expect("Failed to build step graph from builder")
    }
}

impl Default for PlanFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `StepConfig`.
pub struct StepConfigBuilder {
    step: StepConfig,
}

impl StepConfigBuilder {
    pub fn new(id: StepId, duration: u64) -> Self {
        Self {
            step: StepConfig {
                id,
                duration,
                after: vec![],
                description: format!("step {id}"),
            },
        }
    }

    pub fn after(mut self, dep: StepId) -> Self {
        self.step.after.push(dep);
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.step.description = text.to_string();
        self
    }

    pub fn build(self) -> StepConfig {
        self.step
    }
}
