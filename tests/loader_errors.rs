// tests/loader_errors.rs

use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;
use timedag::config::{ConfigOverrides, load_and_validate, load_and_validate_with};
use timedag::errors::TimedagError;

fn plan_file(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn test_unknown_dependency_returns_structured_error() {
    let file = plan_file(
        ".toml",
        r#"
[[step]]
id = 1
duration = 1

[[step]]
id = 4
duration = 2
after = [99]
description = "D"
"#,
    );

    match load_and_validate(file.path()) {
        Err(TimedagError::UnknownDependency { step, dependency }) => {
            assert_eq!(step, 4);
            assert_eq!(dependency, 99);
        }
        Err(e) => panic!("Expected UnknownDependency error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_csv_unknown_dependency_returns_structured_error() {
    let file = plan_file(".csv", "Step,Dependencies,Time (m),Description\n1,99,1,Stir\n");

    assert!(matches!(
        load_and_validate(file.path()),
        Err(TimedagError::UnknownDependency {
            step: 1,
            dependency: 99
        })
    ));
}

#[test]
fn test_dag_cycle_with_cli_override() {
    let file = plan_file(
        ".toml",
        r#"
[[step]]
id = 1
duration = 1
after = [2]

[[step]]
id = 2
duration = 1
after = [1]
"#,
    );

    assert!(load_and_validate(file.path()).is_ok());

    let overrides = ConfigOverrides {
        time_unit: None,
        detect_cycles: true,
    };
    match load_and_validate_with(file.path(), &overrides) {
        Err(TimedagError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains('1') || msg.contains('2'));
        }
        Err(e) => panic!("Expected DagCycle error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_time_unit_override_is_validated() {
    let file = plan_file(".csv", "Step,Dependencies,Time,Description\n1,,1,Wait\n");

    let ok = ConfigOverrides {
        time_unit: Some("250ms".to_string()),
        detect_cycles: false,
    };
    let plan = load_and_validate_with(file.path(), &ok).unwrap();
    assert_eq!(plan.time_unit(), std::time::Duration::from_millis(250));

    let bad = ConfigOverrides {
        time_unit: Some("often".to_string()),
        detect_cycles: false,
    };
    assert!(matches!(
        load_and_validate_with(file.path(), &bad),
        Err(TimedagError::ConfigError(_))
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let path = PathBuf::from("does/not/exist/plan.toml");
    assert!(matches!(
        load_and_validate(&path),
        Err(TimedagError::IoError(_))
    ));
}

#[test]
fn test_malformed_toml_is_toml_error() {
    let file = plan_file(".toml", "[[step]]\nid = \"one\"\nduration = 1\n");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(TimedagError::TomlError(_))
    ));
}
