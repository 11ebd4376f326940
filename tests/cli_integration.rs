//! CLI integration tests
//!
//! Tests the CLI surface: argument parsing, environment validation, and
//! failure behavior before any network interaction.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_flag() {
    let mut cmd = cargo_bin_cmd!("lotto");
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("buy"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_version_flag() {
    let mut cmd = cargo_bin_cmd!("lotto");
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_buy_help_shows_count_option() {
    let mut cmd = cargo_bin_cmd!("lotto");
    cmd.args(["buy", "--help"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--count"));
}

#[test]
fn test_missing_credentials_fail_before_any_request() {
    let mut cmd = cargo_bin_cmd!("lotto");
    cmd.arg("check")
        .env_remove("USERNAME")
        .env_remove("PASSWORD");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("USERNAME"));
}

#[test]
fn test_unknown_subcommand_is_rejected() {
    let mut cmd = cargo_bin_cmd!("lotto");
    cmd.arg("gamble");

    cmd.assert().failure();
}
