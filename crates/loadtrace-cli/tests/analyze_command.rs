use assert_cmd::Command;
use loadtrace_core::AnalysisConfig;
use predicates::prelude::*;
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;

#[allow(deprecated)]
fn get_loadtrace_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("loadtrace")
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn analyze_json(args: &[&str]) -> Value {
    let mut cmd = Command::new(get_loadtrace_bin());
    cmd.env_remove("LOADTRACE_TOP_N")
        .arg("--format")
        .arg("json")
        .arg("analyze")
        .args(args);

    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("stdout should be a JSON report")
}

#[test]
fn test_analyze_file_pairs_markers() {
    let report = loadtrace_cli::commands::analyze::analyze_file(
        &fixture("markers.json"),
        &AnalysisConfig::default(),
    )
    .unwrap();

    assert_eq!(report.summary.total_requests, 4);
    assert_eq!(report.summary.estimated_requests, 1);
    assert_eq!(report.summary.cumulative_time, 2250);
    assert_eq!(report.summary.actual_total_time, 1400);

    let durations: Vec<(&str, i64)> = report
        .slowest_requests
        .iter()
        .map(|r| (r.url.as_str(), r.duration))
        .collect();
    assert_eq!(
        durations,
        vec![
            ("https://x.com/api/data", 1200),
            ("https://x.com/a.js", 500),
            ("https://x.com/style.css", 300),
            ("https://x.com/b.png", 250),
        ]
    );
}

#[test]
fn test_analyze_line_log_as_json() {
    let report = analyze_json(&[fixture("app.log").to_str().unwrap()]);

    assert_eq!(report["summary"]["total_requests"], 3);
    assert_eq!(report["summary"]["estimated_requests"], 0);
    assert_eq!(report["summary"]["cumulative_time"], 1770);
    assert_eq!(report["summary"]["actual_total_time"], 1320);
    assert_eq!(report["summary"]["unique_domains"], 2);
    assert_eq!(report["diagnostics"]["records_seen"], 6);
    assert_eq!(report["diagnostics"]["records_skipped"], 1);
    assert_eq!(
        report["slowest_requests"][0]["url"],
        "https://cdn.example.net/app.js"
    );
    assert_eq!(report["slowest_requests"][1]["duration"], 500);
}

#[test]
fn test_analyze_har_pretty() {
    let mut cmd = Command::new(get_loadtrace_bin());
    cmd.arg("analyze").arg(fixture("sample.har"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Load Performance Report"))
        .stdout(predicate::str::contains("https://api.example.org/v1/users"))
        .stdout(predicate::str::contains("Slow resource"))
        .stdout(predicate::str::contains("Poor parallel loading"));
}

#[test]
fn test_har_negative_time_is_not_a_request() {
    let report = analyze_json(&[fixture("sample.har").to_str().unwrap()]);

    assert_eq!(report["summary"]["total_requests"], 3);
    assert_eq!(report["diagnostics"]["unknown_events"], 1);
    assert_eq!(report["slowest_requests"][0]["resource_type"], "API");
}

#[test]
fn test_top_limits_slowest_requests() {
    let report = analyze_json(&[fixture("markers.json").to_str().unwrap(), "--top", "2"]);
    assert_eq!(report["slowest_requests"].as_array().unwrap().len(), 2);
}

#[test]
fn test_top_from_environment() {
    let mut cmd = Command::new(get_loadtrace_bin());
    cmd.env("LOADTRACE_TOP_N", "1")
        .args(["--format", "json", "analyze"])
        .arg(fixture("markers.json"));

    let output = cmd.assert().success().get_output().stdout.clone();
    let report: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["slowest_requests"].as_array().unwrap().len(), 1);
}

#[test]
fn test_exclude_host() {
    let report = analyze_json(&[
        fixture("app.log").to_str().unwrap(),
        "--exclude-host",
        "cdn.*",
    ]);

    assert_eq!(report["summary"]["total_requests"], 2);
    assert_eq!(report["diagnostics"]["events_rejected"], 1);
}

#[test]
fn test_config_file_with_override() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("loadtrace.json");
    let mut file = std::fs::File::create(&config_path).unwrap();
    writeln!(file, r#"{{"top_n": 3, "include_hosts": ["x.com"]}}"#).unwrap();

    let from_file = analyze_json(&[
        fixture("markers.json").to_str().unwrap(),
        "--config",
        config_path.to_str().unwrap(),
    ]);
    assert_eq!(from_file["slowest_requests"].as_array().unwrap().len(), 3);

    let overridden = analyze_json(&[
        fixture("markers.json").to_str().unwrap(),
        "--config",
        config_path.to_str().unwrap(),
        "--top",
        "1",
    ]);
    assert_eq!(overridden["slowest_requests"].as_array().unwrap().len(), 1);
}

#[test]
fn test_invalid_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("bad.json");
    std::fs::write(&config_path, r#"{"window_ms": 1000}"#).unwrap();

    let mut cmd = Command::new(get_loadtrace_bin());
    cmd.arg("analyze")
        .arg(fixture("markers.json"))
        .arg("--config")
        .arg(&config_path);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn test_missing_file_fails() {
    let mut cmd = Command::new(get_loadtrace_bin());
    cmd.arg("analyze").arg("does-not-exist.log");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_empty_log_reports_zeroes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.log");
    std::fs::write(&path, "").unwrap();

    let report = analyze_json(&[path.to_str().unwrap()]);
    assert_eq!(report["summary"]["total_requests"], 0);
    assert_eq!(report["summary"]["parallel_efficiency"], 0.0);
    assert_eq!(report["recommendations"].as_array().unwrap().len(), 0);
}

#[test]
fn test_analyze_help() {
    let mut cmd = Command::new(get_loadtrace_bin());
    cmd.arg("analyze").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--top"))
        .stdout(predicate::str::contains("--exclude-host"))
        .stdout(predicate::str::contains("LOADTRACE_TOP_N"));
}
