// Integration tests for the `mroute` binary: exit codes and the --json
// stdout contract (exactly one JSON value, nothing else on stdout).
//
// Run with: cargo test -p meterroute-cli --test cli_tests -- --nocapture

use std::path::PathBuf;
use std::process::{Command, Output};

fn mroute() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mroute"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd.env_remove("MROUTE_LOG").env_remove("RUST_LOG");
    cmd
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn run_with_pair(args: &[&str]) -> Output {
    mroute()
        .args(args)
        .arg("--current")
        .arg(fixture("1_current.csv"))
        .arg("--previous")
        .arg(fixture("2_previous.csv"))
        .output()
        .unwrap()
}

/// Assert stdout is a single, parseable JSON value with no extra lines.
fn assert_single_json(stdout: &[u8]) -> serde_json::Value {
    let text = String::from_utf8_lossy(stdout);
    let trimmed = text.trim();
    assert!(!trimmed.is_empty(), "stdout should not be empty");
    serde_json::from_str(trimmed)
        .unwrap_or_else(|e| panic!("stdout must be valid JSON.\nParse error: {e}\nstdout:\n{trimmed}"))
}

// ===========================================================================
// compare
// ===========================================================================

#[test]
fn compare_json_contract() {
    let out = run_with_pair(&["compare", "--json"]);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let val = assert_single_json(&out.stdout);
    assert_eq!(val["currentMonth"].as_array().unwrap().len(), 5);
    assert_eq!(val["previousMonth"].as_array().unwrap().len(), 8);
    assert_eq!(val["comparison"].as_array().unwrap().len(), 4);
    assert_eq!(val["inconsistencies"].as_array().unwrap().len(), 3);
    assert_eq!(val["comparison"][0]["routeLabel"], "Centro");

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("4 route(s), 3 inconsistent"), "stderr: {stderr}");
}

#[test]
fn compare_without_json_keeps_stdout_empty() {
    let out = run_with_pair(&["compare"]);
    assert_eq!(out.status.code(), Some(0));
    assert!(out.stdout.is_empty());
}

#[test]
fn compare_fails_on_inconsistency_when_asked() {
    let out = run_with_pair(&["compare", "--fail-on-inconsistency"]);
    assert_eq!(out.status.code(), Some(7));
    assert!(String::from_utf8_lossy(&out.stderr).contains("3 inconsistent route(s)"));
}

#[test]
fn compare_writes_output_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let target = dir.path().join("result.json");
    let out = mroute()
        .arg("compare")
        .arg("--current")
        .arg(fixture("1_current.csv"))
        .arg("--previous")
        .arg(fixture("2_previous.csv"))
        .arg("--output")
        .arg(&target)
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0));
    let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
    assert!(written.get("currentMonth").is_some());
}

#[test]
fn folder_discovery_matches_explicit_paths() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::copy(fixture("1_current.csv"), dir.path().join("1_marco.csv")).unwrap();
    std::fs::copy(fixture("2_previous.csv"), dir.path().join("2_fevereiro.csv")).unwrap();

    let from_dir = mroute().args(["compare", "--json", "--dir"]).arg(dir.path()).output().unwrap();
    assert_eq!(from_dir.status.code(), Some(0));
    let explicit = run_with_pair(&["compare", "--json"]);
    assert_eq!(from_dir.stdout, explicit.stdout);
}

// ===========================================================================
// Derived views
// ===========================================================================

#[test]
fn routes_json() {
    let out = run_with_pair(&["routes", "--json"]);
    assert_eq!(out.status.code(), Some(0));
    let val = assert_single_json(&out.stdout);
    assert_eq!(val[0]["route"], "101");
    assert_eq!(val[0]["totalCurrent"], 3);
    assert_eq!(val[0]["diff"], -1);
}

#[test]
fn units_filter_and_sort() {
    let out = run_with_pair(&["units", "--json", "--gd", "normal", "--sort", "consumption", "--desc"]);
    assert_eq!(out.status.code(), Some(0));
    let val = assert_single_json(&out.stdout);
    let codes: Vec<_> = val["units"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["unitCode"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(codes, vec!["1001", "1005", "1007", "1003"]);
    assert_eq!(val["routes"], serde_json::json!(["101", "202", "303"]));
}

#[test]
fn divergences_json_with_totals() {
    let out = run_with_pair(&["divergences", "--json", "--route", "202"]);
    assert_eq!(out.status.code(), Some(0));
    let val = assert_single_json(&out.stdout);
    assert_eq!(val["entries"].as_array().unwrap().len(), 2);
    assert_eq!(val["entries"][0]["status"], "missing");
    assert_eq!(val["totals"]["missing"], 2);
    assert_eq!(val["totals"]["new"], 0);
}

#[test]
fn recurring_filtered_by_reason() {
    let out = run_with_pair(&["recurring", "--json", "--reason", "SEM ACESSO"]);
    assert_eq!(out.status.code(), Some(0));
    let val = assert_single_json(&out.stdout);
    assert_eq!(val["occurrences"].as_array().unwrap().len(), 1);
    assert_eq!(val["occurrences"][0]["unitCode"], "1003");
    assert_eq!(val["reasons"], serde_json::json!(["Leitura Realizada", "SEM ACESSO"]));
}

#[test]
fn brief_without_narrator() {
    let out = run_with_pair(&["brief", "--json"]);
    assert_eq!(out.status.code(), Some(0));
    let val = assert_single_json(&out.stdout);
    assert_eq!(val["brief"]["totalConsumptionCurrent"], 345.5);
    assert_eq!(val["brief"]["routeHighlights"].as_array().unwrap().len(), 3);
    assert!(val["narrative"].is_null());
}

#[cfg(unix)]
#[test]
fn brief_narrator_failure_keeps_numbers() {
    let out = run_with_pair(&["brief", "--json", "--narrate-with", "exit 1"]);
    assert_eq!(out.status.code(), Some(0));
    let val = assert_single_json(&out.stdout);
    assert_eq!(val["brief"]["totalConsumptionCurrent"], 345.5);
    assert_eq!(val["narrative"], "Automatic report could not be generated at this time.");
}

// ===========================================================================
// Failures
// ===========================================================================

#[test]
fn missing_inputs_is_usage_error() {
    let out = mroute().arg("compare").output().unwrap();
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn unreadable_file_is_io_error() {
    let out = mroute()
        .arg("compare")
        .arg("--current")
        .arg(fixture("does_not_exist.csv"))
        .arg("--previous")
        .arg(fixture("2_previous.csv"))
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&out.stderr).contains("does_not_exist.csv"));
}

#[test]
fn header_only_file_is_empty_error() {
    let out = mroute()
        .arg("compare")
        .arg("--current")
        .arg(fixture("1_current.csv"))
        .arg("--previous")
        .arg(fixture("header_only.csv"))
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&out.stderr).contains("previous period file"));
}

#[test]
fn missing_quantity_column() {
    let out = mroute()
        .arg("compare")
        .arg("--current")
        .arg(fixture("no_quantity.csv"))
        .arg("--previous")
        .arg(fixture("2_previous.csv"))
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(5));
    assert!(String::from_utf8_lossy(&out.stderr).contains("[columns] quantity"));
}

#[test]
fn invalid_config_is_rejected() {
    let out = mroute().args(["config", "validate"]).arg(fixture("bad.toml")).output().unwrap();
    assert_eq!(out.status.code(), Some(6));

    let out = run_with_pair(&["compare", "--config", fixture("bad.toml").to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(6));
}

#[test]
fn folder_without_previous_export() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::copy(fixture("1_current.csv"), dir.path().join("1_marco.csv")).unwrap();
    let out = mroute().args(["compare", "--dir"]).arg(dir.path()).output().unwrap();
    assert_eq!(out.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&out.stderr).contains("no previous period file"));
}
