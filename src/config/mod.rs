// src/config/mod.rs

//! Step plan loading and validation.
//!
//! Responsibilities:
//! - Define the serde-backed data model (`model.rs`).
//! - Load a plan from a TOML or CSV file (`loader.rs`).
//! - Validate ids, dependencies and, optionally, acyclicity (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{
    load_and_validate, load_and_validate_with, load_from_path, parse_csv_plan, parse_toml_plan,
};
pub use model::{ConfigOverrides, ConfigSection, PlanFile, RawPlanFile, StepConfig};
pub use validate::validate_plan;
