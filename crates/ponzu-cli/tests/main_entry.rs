//! Integration tests for the `ponzu` binary entry point.
//!
//! Verifies usage output for bare and help invocations and the failure
//! reported when `serve` is asked for an unknown service.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::{contains, starts_with};
use tempfile::TempDir;

#[test]
fn bare_invocation_prints_usage() {
    let mut command = cargo_bin_cmd!("ponzu");
    command
        .assert()
        .success()
        .stdout(starts_with("Usage: ponzu [flags] <command> [args]"));
}

#[test]
fn help_topic_prints_the_build_section() {
    let mut command = cargo_bin_cmd!("ponzu");
    command.args(["help", "build"]);
    command
        .assert()
        .success()
        .stdout(contains("Composes the framework"));
}

#[test]
fn serve_with_unknown_service_fails_without_touching_the_store() {
    let dir = TempDir::new().expect("temp dir");
    let store = dir.path().join("data");
    let mut command = cargo_bin_cmd!("ponzu");
    command
        .current_dir(dir.path())
        .arg("--store-dir")
        .arg(&store)
        .args(["serve", "bogus"]);
    command
        .assert()
        .failure()
        .stdout(contains(
            "To execute 'ponzu serve', you must specify which service to run.",
        ))
        .stdout(contains("$ ponzu --help"));
    assert!(!store.exists());
}

#[test]
fn run_without_an_artifact_fails() {
    let dir = TempDir::new().expect("temp dir");
    let mut command = cargo_bin_cmd!("ponzu");
    command.current_dir(dir.path()).arg("run");
    command
        .assert()
        .failure()
        .stderr(contains("failed to start"));
}
