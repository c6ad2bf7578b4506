mod common;

use std::fs;

use common::{assert_exit_code, model_path, record_path, run, stderr, stdout};
use serde_json::Value;
use tempfile::TempDir;

#[test]
fn repair_writes_valid_record() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("fixed.json");

    let output = run(&[
        "repair",
        &record_path(),
        "-m",
        &model_path(),
        "-o",
        out.to_str().unwrap(),
    ]);
    assert_exit_code(&output, 0);
    assert!(stderr(&output).contains("wrap-in-array: 7"));

    let fixed: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(fixed["MeasurementType"], serde_json::json!(["ImageIntensity"]));
    assert_eq!(
        fixed["TemporalDescription"]["TimeSpan"]["StopDate"],
        "2000-01-01T00:00:00Z"
    );

    // The repaired body validates cleanly
    let check = run(&[
        "validate",
        out.to_str().unwrap(),
        "-m",
        &model_path(),
        "--class",
        "DisplayData",
    ]);
    assert_exit_code(&check, 0);
}

#[test]
fn repair_stops_at_iteration_limit() {
    let output = run(&[
        "repair",
        &record_path(),
        "-m",
        &model_path(),
        "--max-iterations",
        "1",
    ]);
    assert_exit_code(&output, 1);
    assert!(stderr(&output).contains("Stopped after 1 repair passes"));
    assert!(stdout(&output).contains("issue(s)"));
}

#[test]
fn repair_reports_unrepairable_record() {
    let dir = TempDir::new().unwrap();
    let record = dir.path().join("extra.json");
    fs::write(
        &record,
        r#"{"StartDate": "2000-01-01T00:00:00Z", "StopDate": "2000-01-01T00:00:00Z", "Epoch": "J2000"}"#,
    )
    .unwrap();
    let out = dir.path().join("fixed.json");

    let output = run(&[
        "repair",
        record.to_str().unwrap(),
        "-m",
        &model_path(),
        "--class",
        "TimeSpan",
        "-o",
        out.to_str().unwrap(),
    ]);
    assert_exit_code(&output, 1);
    assert!(stdout(&output).contains("1 issue(s)"));
    assert!(!out.exists());
}
