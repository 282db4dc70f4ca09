// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod report;
pub mod timer;
pub mod types;

use std::sync::Arc;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{PlanFile, load_and_validate_with};
use crate::dag::StepGraph;
use crate::engine::{Driver, DriverOptions, RunSummary};
use crate::errors::Result;
use crate::report::ConsoleReporter;
use crate::timer::TokioTimer;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - plan loading (+ CLI overrides)
/// - the step graph
/// - the driver with Tokio timers and console reporting
pub async fn run(args: CliArgs) -> Result<()> {
    let plan = load_and_validate_with(&args.input, &args.config_overrides())?;
    info!(
        input = %args.input.display(),
        steps = plan.step.len(),
        time_unit = %plan.config.time_unit,
        "plan loaded"
    );

    if args.dry_run {
        print_dry_run(&plan)?;
        return Ok(());
    }

    let options = DriverOptions {
        time_unit: plan.time_unit(),
        fail_on_stall: args.fail_on_stall,
    };

    let summary = run_plan(&plan, options).await?;
    debug!(?summary, "run finished");
    Ok(())
}

/// Run a validated plan with production timers and console output.
pub async fn run_plan(plan: &PlanFile, options: DriverOptions) -> Result<RunSummary> {
    let graph = StepGraph::from_plan(plan)?;
    let driver = Driver::new(graph, Arc::new(ConsoleReporter::new()), TokioTimer::new(), options);
    driver.run().await
}

/// Simple dry-run output: print steps, deps and durations.
fn print_dry_run(plan: &PlanFile) -> Result<()> {
    let graph = StepGraph::from_plan(plan)?;

    println!("timedag dry-run");
    println!("  config.time_unit = {}", plan.config.time_unit);
    println!("  config.detect_cycles = {}", plan.config.detect_cycles);
    println!();

    println!("steps ({}):", graph.count());
    for step in graph.steps() {
        println!("  - {}: {}", step.id, step.description);
        println!("      duration: {}", step.duration);
        if !step.dependencies.is_empty() {
            println!("      after: {:?}", step.dependencies);
        }
        let dependents = graph.dependents_of(step.id);
        if !dependents.is_empty() {
            println!("      before: {:?}", dependents);
        }
    }
    println!();

    match graph.topological_order() {
        Ok(order) => println!("order: {:?}", order),
        Err(e) => println!("order: unavailable ({e})"),
    }

    debug!("dry-run complete (no timers armed)");
    Ok(())
}
