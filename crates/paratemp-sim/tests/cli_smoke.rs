use std::fs;
use std::process::Command;

use serde_json::Value;

const BIN: &str = env!("CARGO_BIN_EXE_paratemp-sim");

#[test]
fn ladder_prints_json() {
    let output = Command::new(BIN)
        .args(["ladder", "--t-min", "1", "--t-max", "8", "--replicas", "4"])
        .output()
        .expect("run paratemp-sim ladder");
    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).expect("json");
    let temps = value["temperatures"].as_array().expect("temperatures");
    assert_eq!(temps.len(), 4);
    assert!((temps[1].as_f64().unwrap() - 2.0).abs() < 1e-9);
    assert_eq!(value["betas"].as_array().map(Vec::len), Some(4));
}

#[test]
fn ladder_rejects_a_single_replica() {
    let output = Command::new(BIN)
        .args(["ladder", "--replicas", "1"])
        .output()
        .expect("run paratemp-sim ladder");
    assert!(!output.status.success());
}

#[test]
fn double_well_writes_artefacts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("run");
    let output = Command::new(BIN)
        .args(["double-well", "--iterations", "40", "--seed", "5", "--out"])
        .arg(&out)
        .output()
        .expect("run paratemp-sim double-well");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let summary: Value =
        serde_json::from_str(&fs::read_to_string(out.join("summary.json")).expect("summary"))
            .expect("json");
    assert_eq!(summary["run"]["iterations"], 40);
    assert_eq!(summary["master_seed"], 5);
    assert_eq!(summary["run"]["pairs"].as_array().map(Vec::len), Some(7));

    let trace = fs::read_to_string(out.join("trace.csv")).expect("trace");
    assert_eq!(trace.lines().count(), 1 + 40 * 8);
    assert!(out.join("config.yaml").exists());
}
