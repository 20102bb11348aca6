#![allow(missing_docs)]

use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("cli.toml");
    fs::write(&path, contents).expect("write config");
    path
}

#[test]
fn find_emits_json_lines_and_signals_leaks() {
    let dir = TempDir::new().expect("tempdir");
    let config = write_config(&dir, "");
    let output = cargo_bin_cmd!("leakpath")
        .arg("--config")
        .arg(&config)
        .args(["--format", "json", "find", "--log"])
        .arg(fixture("shutdown.cclog"))
        .arg("--candidates")
        .arg(fixture("candidates.json"))
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();

    let text = String::from_utf8(output).expect("utf8 stdout");
    let records: Vec<Value> = text
        .lines()
        .map(|line| serde_json::from_str(line).expect("valid json"))
        .collect();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["test"], "browser_leak.js");
    assert_eq!(records[0]["subtest"], "Shutdown");
    assert_eq!(
        records[1]["message"],
        "leaked window until shutdown [url = about:blank]"
    );
    assert_eq!(
        records[2]["stack"],
        "serial=unknown\nnot found in CC graph at 0xdead"
    );
}

#[test]
fn find_with_no_candidates_succeeds() {
    let dir = TempDir::new().expect("tempdir");
    let config = write_config(&dir, "");
    let candidates = dir.path().join("none.json");
    fs::write(&candidates, "[]").expect("write candidates");
    let output = cargo_bin_cmd!("leakpath")
        .arg("--config")
        .arg(&config)
        .args(["--theme", "plain", "find", "--log"])
        .arg(fixture("shutdown.cclog"))
        .arg("--candidates")
        .arg(&candidates)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).expect("utf8 stdout");
    assert!(text.contains("no leaked objects to explain"));
}

#[test]
fn config_file_sets_subtest_and_flags_override() {
    let dir = TempDir::new().expect("tempdir");
    let config = write_config(&dir, "[report]\nsubtest = \"Quit\"\nclean_names = false\n");

    let output = cargo_bin_cmd!("leakpath")
        .arg("--config")
        .arg(&config)
        .args(["--format", "json", "path", "--address", "0x100", "--log"])
        .arg(fixture("shutdown.cclog"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let record: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(record["subtest"], "Quit");
    assert_eq!(record["test"], "(cli)");
    assert!(record["stack"]
        .as_str()
        .expect("stack string")
        .contains("JS Object (Function - onunload)"));

    let output = cargo_bin_cmd!("leakpath")
        .arg("--config")
        .arg(&config)
        .args(["--format", "json", "--subtest", "Shutdown", "path"])
        .args(["--address", "0x100", "--log"])
        .arg(fixture("shutdown.cclog"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let record: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(record["subtest"], "Shutdown");
}

#[test]
fn stats_reports_capture_counters() {
    let dir = TempDir::new().expect("tempdir");
    let config = write_config(&dir, "[trace]\nbatch_lines = 4\n");
    let output = cargo_bin_cmd!("leakpath")
        .arg("--config")
        .arg(&config)
        .args(["--format", "json", "stats", "--log"])
        .arg(fixture("shutdown.cclog"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["nodes"], 5);
    assert_eq!(json["edges"], 4);
    assert_eq!(json["roots"], 1);
    assert_eq!(json["garbage"], 2);
    assert_eq!(json["pulls"], 4);
    assert!(json["elapsed_ms"].is_number());
}

#[test]
fn path_text_prints_stack() {
    let dir = TempDir::new().expect("tempdir");
    let config = write_config(&dir, "");
    let output = cargo_bin_cmd!("leakpath")
        .arg("--config")
        .arg(&config)
        .args(["path", "--address", "0x100", "--log"])
        .arg(fixture("shutdown.cclog"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).expect("utf8 stdout");
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].ends_with("@ 0x100"));
    assert_eq!(
        lines[2],
        "  mObservers[i] \u{2014} nsObserverService [root, 3 unknown ref(s)] @ 0x300"
    );
}

#[test]
fn strict_mode_rejects_malformed_log() {
    let dir = TempDir::new().expect("tempdir");
    let config = write_config(&dir, "");
    let log = dir.path().join("bad.cclog");
    fs::write(&log, "0x1 [gc] A\nnot a line\n").expect("write log");
    cargo_bin_cmd!("leakpath")
        .arg("--config")
        .arg(&config)
        .args(["--strict", "stats", "--log"])
        .arg(&log)
        .assert()
        .code(1);
}

#[test]
fn explicit_missing_config_is_an_error() {
    let dir = TempDir::new().expect("tempdir");
    cargo_bin_cmd!("leakpath")
        .arg("--config")
        .arg(dir.path().join("absent.toml"))
        .args(["stats", "--log"])
        .arg(fixture("shutdown.cclog"))
        .assert()
        .code(1);
}
