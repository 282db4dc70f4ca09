// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::dag::StepId;

/// Step plan exactly as read from disk, before validation.
///
/// TOML layout:
///
/// ```toml
/// [config]
/// time_unit = "1s"
/// detect_cycles = false
///
/// [[step]]
/// id = 1
/// duration = 3
/// description = "Boil water"
///
/// [[step]]
/// id = 2
/// duration = 5
/// after = [1]
/// description = "Cook pasta"
/// ```
///
/// CSV files produce the same structure with a default `[config]`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPlanFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// Steps in declaration order.
    #[serde(default)]
    pub step: Vec<StepConfig>,
}

/// A plan that passed validation. Only constructed through
/// `TryFrom<RawPlanFile>`.
#[derive(Debug, Clone)]
pub struct PlanFile {
    pub config: ConfigSection,
    pub step: Vec<StepConfig>,
    time_unit: Duration,
}

impl PlanFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        step: Vec<StepConfig>,
        time_unit: Duration,
    ) -> Self {
        Self {
            config,
            step,
            time_unit,
        }
    }

    /// Wall-clock length of one duration unit, as parsed during validation.
    pub fn time_unit(&self) -> Duration {
        self.time_unit
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Length of one duration unit, e.g. `"1s"`, `"250ms"`, `"1m"`.
    #[serde(default = "default_time_unit")]
    pub time_unit: String,

    /// Reject plans with dependency cycles at load time.
    ///
    /// Off by default: a cyclic plan then simply never finishes.
    #[serde(default)]
    pub detect_cycles: bool,
}

fn default_time_unit() -> String {
    "1s".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            time_unit: default_time_unit(),
            detect_cycles: false,
        }
    }
}

/// `[[step]]` entry.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StepConfig {
    pub id: StepId,

    /// Number of time units the step takes.
    pub duration: u64,

    /// Steps that must complete first.
    #[serde(default)]
    pub after: Vec<StepId>,

    #[serde(default)]
    pub description: String,
}

/// Settings supplied on the command line, applied on top of the file's
/// `[config]` section before validation.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub time_unit: Option<String>,
    pub detect_cycles: bool,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut ConfigSection) {
        if let Some(ref unit) = self.time_unit {
            config.time_unit = unit.clone();
        }
        if self.detect_cycles {
            config.detect_cycles = true;
        }
    }
}
