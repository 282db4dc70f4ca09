// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::dag::{StepId, StepState};

#[derive(Error, Debug)]
pub enum TimedagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Duplicate step id: {0}")]
    DuplicateStep(StepId),

    #[error("Step {step} depends on unknown step {dependency}")]
    UnknownDependency { step: StepId, dependency: StepId },

    #[error("Step not found: {0}")]
    UnknownStep(StepId),

    #[error("Cycle detected in step graph: {0}")]
    DagCycle(String),

    #[error("Step {step} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        step: StepId,
        from: StepState,
        to: StepState,
    },

    #[error("Timer error: {0}")]
    TimerError(String),

    #[error("Scheduler stalled with {completed}/{total} steps completed")]
    Stalled { completed: usize, total: usize },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TimedagError>;
