// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::{ConfigOverrides, ConfigSection, PlanFile, RawPlanFile, StepConfig};
use crate::dag::StepId;
use crate::errors::{Result, TimedagError};
use crate::types::PlanFormat;

/// Load a plan file from a given path and return the raw [`RawPlanFile`].
///
/// The format is picked from the extension (`.toml` or `.csv`). This only
/// parses; it does **not** check dependencies or cycles. Use
/// [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawPlanFile> {
    let path = path.as_ref();
    let format = PlanFormat::from_path(path).ok_or_else(|| {
        TimedagError::ConfigError(format!(
            "unsupported plan file '{}': expected a .toml or .csv extension",
            path.display()
        ))
    })?;

    let contents = fs::read_to_string(path)?;
    debug!(path = %path.display(), ?format, "read plan file");

    match format {
        PlanFormat::Toml => parse_toml_plan(&contents),
        PlanFormat::Csv => parse_csv_plan(&contents),
    }
}

/// Load a plan file from path and validate it.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML or CSV.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - empty plans and duplicate step ids,
///   - unknown dependencies,
///   - an unparsable `time_unit`,
///   - cycles (self-dependencies included), when `detect_cycles` is enabled.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<PlanFile> {
    load_and_validate_with(path, &ConfigOverrides::default())
}

/// Like [`load_and_validate`], with command-line overrides applied to the
/// `[config]` section before validation.
pub fn load_and_validate_with(
    path: impl AsRef<Path>,
    overrides: &ConfigOverrides,
) -> Result<PlanFile> {
    let mut raw = load_from_path(path)?;
    overrides.apply(&mut raw.config);
    PlanFile::try_from(raw)
}

pub fn parse_toml_plan(contents: &str) -> Result<RawPlanFile> {
    let plan: RawPlanFile = toml::from_str(contents)?;
    Ok(plan)
}

/// Parse a recipe CSV: `Step, Dependencies, Time, Description`.
///
/// The header row is required but its names are not checked. Dependencies
/// are separated by whitespace, `;` or `|`; an empty cell means none.
/// Unquoted commas in the description are kept as written; only the
/// description's outer whitespace is trimmed.
pub fn parse_csv_plan(contents: &str) -> Result<RawPlanFile> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .comment(Some(b'#'))
        .from_reader(contents.as_bytes());

    let mut steps = Vec::new();

    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        if record.len() < 3 {
            return Err(TimedagError::ConfigError(format!(
                "line {line}: expected at least 3 fields (step, dependencies, time), got {}",
                record.len()
            )));
        }

        let id_field = record[0].trim();
        let id: StepId = id_field.parse().map_err(|e| {
            TimedagError::ConfigError(format!("line {line}: invalid step id '{id_field}': {e}"))
        })?;

        let after = record[1]
            .split(|c: char| c.is_whitespace() || c == ';' || c == '|')
            .filter(|s| !s.is_empty())
            .map(|dep| {
                dep.parse::<StepId>().map_err(|e| {
                    TimedagError::ConfigError(format!(
                        "line {line}: step {id} has invalid dependency '{dep}': {e}"
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let time_field = record[2].trim();
        let duration: u64 = time_field.parse().map_err(|e| {
            TimedagError::ConfigError(format!(
                "line {line}: step {id} has invalid time '{time_field}': {e}"
            ))
        })?;

        let description = record
            .iter()
            .skip(3)
            .collect::<Vec<_>>()
            .join(",")
            .trim()
            .to_string();

        steps.push(StepConfig {
            id,
            duration,
            after,
            description,
        });
    }

    Ok(RawPlanFile {
        config: ConfigSection::default(),
        step: steps,
    })
}
