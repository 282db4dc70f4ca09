// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::ConfigOverrides;

/// Command-line arguments for `timedag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "timedag",
    version,
    about = "Run timed steps in dependency order.",
    long_about = None
)]
pub struct CliArgs {
    /// Step plan to run: a TOML file, or a CSV file with
    /// `Step, Dependencies, Time, Description` columns.
    #[arg(short = 'i', long, value_name = "FILE")]
    pub input: PathBuf,

    /// Length of one duration unit (e.g. `1s`, `250ms`, `1m`).
    ///
    /// Overrides `[config].time_unit` from the plan file.
    #[arg(long, value_name = "DURATION")]
    pub time_unit: Option<String>,

    /// Reject plans with dependency cycles instead of waiting forever.
    #[arg(long)]
    pub detect_cycles: bool,

    /// Exit with an error once no step can ever become ready again.
    #[arg(long)]
    pub fail_on_stall: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TIMEDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the plan, but don't start any timers.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    pub fn config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            time_unit: self.time_unit.clone(),
            detect_cycles: self.detect_cycles,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_is_required() {
        assert!(CliArgs::try_parse_from(["timedag"]).is_err());
    }

    #[test]
    fn parses_short_input_and_overrides() {
        let args = CliArgs::try_parse_from([
            "timedag",
            "-i",
            "recipe.csv",
            "--time-unit",
            "100ms",
            "--detect-cycles",
        ])
        .unwrap();

        assert_eq!(args.input, PathBuf::from("recipe.csv"));
        assert!(!args.dry_run);
        assert!(!args.fail_on_stall);

        let overrides = args.config_overrides();
        assert_eq!(overrides.time_unit.as_deref(), Some("100ms"));
        assert!(overrides.detect_cycles);
    }
}
