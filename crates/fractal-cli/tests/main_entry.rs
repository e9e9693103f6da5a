//! Integration tests for the `fractal` binary entry point.
//!
//! Verifies help output and user-facing failures when no credentials are
//! cached, with and without configuration flags.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;

#[test]
fn help_succeeds() {
    let mut command = cargo_bin_cmd!("fractal");
    command.arg("--help");
    command
        .assert()
        .success()
        .stdout(contains("Fractal Networks"));
}

#[test]
fn whoami_without_credentials_fails() {
    let data_dir = tempfile::tempdir().expect("temporary directory");
    let mut command = cargo_bin_cmd!("fractal");
    command
        .arg("--data-dir")
        .arg(data_dir.path())
        .args(["auth", "whoami"]);
    command
        .assert()
        .code(1)
        .stderr(contains("You are not logged in."));
}

#[test]
fn whoami_runs_on_built_in_defaults() {
    let home = tempfile::tempdir().expect("temporary directory");
    let mut command = cargo_bin_cmd!("fractal");
    command
        .env_remove("FRACTAL_DATA_DIR")
        .env_remove("FRACTAL_CONFIG_PATH")
        .env("HOME", home.path())
        .env("XDG_DATA_HOME", home.path())
        .args(["auth", "whoami"]);
    command
        .assert()
        .code(1)
        .stderr(contains("You are not logged in."));
}

#[test]
fn unknown_command_is_a_usage_error() {
    let mut command = cargo_bin_cmd!("fractal");
    command.arg("teleport");
    command.assert().code(2).stderr(contains("teleport"));
}
