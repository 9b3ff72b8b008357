//! Runs every unit under `test-units/` and compares its outcome

use integration_tests::{load_cases, units_dir};
use std::fs;

#[test]
fn test_all_units() {
    let cases = load_cases(units_dir()).unwrap();
    assert!(!cases.is_empty(), "no units found in {}", units_dir().display());

    let mut failures = Vec::new();
    for case in &cases {
        match case.run() {
            Ok(actual) if actual == case.expected => {}
            Ok(actual) => failures.push(format!(
                "{}: expected `{}`, got `{}`",
                case.name, case.expected, actual
            )),
            Err(err) => failures.push(format!("{}: {err:#}", case.name)),
        }
    }

    assert!(failures.is_empty(), "{} units failed:\n{}", failures.len(), failures.join("\n"));
}

#[test]
fn test_missing_expected_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let case_dir = dir.path().join("lonely");
    fs::create_dir(&case_dir).unwrap();
    fs::write(case_dir.join("unit.json"), "[]").unwrap();

    let err = load_cases(dir.path()).unwrap_err();
    assert!(err.to_string().contains("missing expected.txt for lonely"));
}

#[test]
fn test_directories_without_units_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("notes")).unwrap();

    let cases = load_cases(dir.path()).unwrap();
    assert!(cases.is_empty());
}
