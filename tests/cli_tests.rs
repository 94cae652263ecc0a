//! Integration tests for the geoassist CLI

use serde_json::Value;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn write_fixtures(dir: &TempDir, actions: &str) -> (std::path::PathBuf, std::path::PathBuf) {
    let config = dir.path().join("geoassist.toml");
    fs::write(&config, "[logging]\nlevel = \"warn\"\nformat = \"pretty\"\n").unwrap();
    let actions_path = dir.path().join("actions.json");
    fs::write(&actions_path, actions).unwrap();
    (config, actions_path)
}

fn run(args: &[&std::ffi::OsStr]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_geoassist"))
        .args(args)
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = run(&["--help".as_ref()]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("geoassist"));
    assert!(stdout.contains("--reference-date"));
}

/// Test an action list prints one outcome per action
#[test]
fn test_cli_processes_action_list() {
    let dir = TempDir::new().unwrap();
    let (config, actions) = write_fixtures(
        &dir,
        r#"[
            {"action_type": "add_marker", "lat": 41.88, "lon": -87.63, "popup": "Chicago"},
            {"action_type": "analyze_wind_risk"}
        ]"#,
    );
    let output = run(&[
        actions.as_os_str(),
        "--config".as_ref(),
        config.as_os_str(),
        "--reference-date".as_ref(),
        "2025-01-10".as_ref(),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let outcomes: Vec<Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0]["layers"][0]["label"], "Marker");
    assert_eq!(outcomes[0]["bounds"][0][0], 41.88);
    assert!(outcomes[1]["error"].as_str().unwrap().contains("region"));
    assert_eq!(outcomes[1]["layers"], Value::Array(vec![]));
}

/// Test GeoJSON output for a single action object
#[test]
fn test_cli_geojson_output() {
    let dir = TempDir::new().unwrap();
    let (config, actions) = write_fixtures(
        &dir,
        r#"{"action_type": "fit_bounds", "bounds": [[40.0, -80.0], [42.0, -75.0]]}"#,
    );
    let output = run(&[
        actions.as_os_str(),
        "--config".as_ref(),
        config.as_os_str(),
        "--format".as_ref(),
        "geojson".as_ref(),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let outcomes: Vec<Value> = serde_json::from_slice(&output.stdout).unwrap();
    let collection = &outcomes[0]["layers"][0];
    assert_eq!(collection["type"], "FeatureCollection");
    assert_eq!(collection["features"][0]["geometry"]["type"], "Polygon");
}
