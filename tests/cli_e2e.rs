//! End-to-end CLI tests for the citegen binary.

use assert_cmd::Command;
use predicates::prelude::*;

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let mut cmd = Command::cargo_bin("citegen").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Generate formatted citations"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    let mut cmd = Command::cargo_bin("citegen").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("citegen"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    let mut cmd = Command::cargo_bin("citegen").unwrap();
    cmd.arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

/// Test that an empty piped stdin produces guidance and a non-zero exit.
#[test]
fn test_binary_empty_stdin_prints_guidance_and_fails() {
    let mut cmd = Command::cargo_bin("citegen").unwrap();
    cmd.write_stdin("")
        .assert()
        .failure()
        .stdout(predicate::str::contains("empty stdin"))
        .stderr(predicate::str::contains("no URLs to process"));
}

/// Test that whitespace-only stdin is treated the same as empty.
#[test]
fn test_binary_whitespace_stdin_rejected() {
    let mut cmd = Command::cargo_bin("citegen").unwrap();
    cmd.write_stdin("   \n\n  \n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no URLs to process"));
}

/// Test that a whitespace-only positional argument exits nonzero, without
/// the no-input guidance (input was provided, it just held no URLs).
#[test]
fn test_binary_whitespace_argument_rejected() {
    let mut cmd = Command::cargo_bin("citegen").unwrap();
    cmd.arg("   ")
        .assert()
        .failure()
        .stdout(predicate::str::contains("No input provided").not())
        .stderr(predicate::str::contains("no URLs to process"));
}

/// Test that an invalid style value is rejected by argument parsing.
#[test]
fn test_binary_invalid_style_rejected() {
    let mut cmd = Command::cargo_bin("citegen").unwrap();
    cmd.args(["-s", "bibtex"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown citation style"));
}

/// Test that out-of-range concurrency is rejected by argument parsing.
#[test]
fn test_binary_concurrency_out_of_range_rejected() {
    let mut cmd = Command::cargo_bin("citegen").unwrap();
    cmd.args(["-c", "0", "https://example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
