// src/dag/mod.rs

//! Step graph representation.
//!
//! - [`step`] holds a single timed step and its lifecycle state.
//! - [`graph`] owns every step of a plan, answers readiness queries and
//!   removes satisfied dependencies.

pub mod graph;
pub mod step;

pub use graph::StepGraph;
pub use step::{Step, StepId, StepState};
