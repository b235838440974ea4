//! Smoke tests for the beamdrop binary

use assert_cmd::Command;
use predicates::prelude::*;

fn beamdrop(config: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("beamdrop").unwrap();
    cmd.env("BEAMDROP_CONFIG", config).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let mut cmd = Command::cargo_bin("beamdrop").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("services"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_run_help() {
    let mut cmd = Command::cargo_bin("beamdrop").unwrap();
    cmd.arg("run").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Address to bind to"));
}

#[test]
fn test_config_path_honours_env() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");

    beamdrop(&path)
        .arg("config")
        .arg("path")
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_config_init_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    beamdrop(&path).args(["config", "init"]).assert().success();
    assert!(path.exists());

    beamdrop(&path)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    beamdrop(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("127.0.0.1:34115"))
        .stdout(predicate::str::contains("interval_ms = 1000"));
}

#[test]
fn test_services_lists_greet() {
    let dir = tempfile::tempdir().unwrap();

    beamdrop(&dir.path().join("absent.toml"))
        .arg("services")
        .assert()
        .success()
        .stdout(predicate::str::contains("GreetService.Greet(String) -> String"));
}

#[test]
fn test_invalid_config_exits_with_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[ticker]\ninterval_ms = 0\n").unwrap();

    beamdrop(&path)
        .arg("services")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("interval_ms"));
}

#[test]
fn test_startup_failure_exits_with_failure() {
    let dir = tempfile::tempdir().unwrap();

    beamdrop(&dir.path().join("absent.toml"))
        .args(["run", "--bind", "127.0.0.1:0", "--assets"])
        .arg(dir.path().join("no-such-dir"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("asset directory"));
}
