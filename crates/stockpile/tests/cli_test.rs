//! Integration tests for the `stockpile` CLI binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! and error handling — all without requiring a live backend.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `stockpile` binary with env isolation.
///
/// Clears all `STOCKPILE_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn stockpile_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("stockpile");
    cmd.env("HOME", "/tmp/stockpile-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/stockpile-cli-test-nonexistent")
        .env_remove("STOCKPILE_BACKEND_URL")
        .env_remove("STOCKPILE_EMAIL")
        .env_remove("STOCKPILE_PASSWORD")
        .env_remove("STOCKPILE_OUTPUT")
        .env_remove("STOCKPILE_TIMEOUT")
        .env_remove("STOCKPILE_ASSIST_API_KEY");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = stockpile_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    stockpile_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("inventory")
            .and(predicate::str::contains("products"))
            .and(predicate::str::contains("sales"))
            .and(predicate::str::contains("suppliers")),
    );
}

#[test]
fn test_version_flag() {
    stockpile_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("stockpile"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    stockpile_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    stockpile_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Config commands ─────────────────────────────────────────────────

#[test]
fn test_config_path_prints_location() {
    stockpile_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_unknown_subcommand_fails() {
    stockpile_cmd()
        .arg("frobnicate")
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_missing_email_fails_before_network() {
    // No --email, no env, no config file: the command must fail with
    // the auth exit code without ever needing a backend.
    let output = stockpile_cmd()
        .args(["products", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "Expected auth exit code");
    let text = combined_output(&output);
    assert!(
        text.contains("email"),
        "Expected email hint in output:\n{text}"
    );
}

#[test]
fn test_sales_record_requires_quantity() {
    stockpile_cmd()
        .args(["sales", "record", "--product", "p1"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_products_add_rejects_conflicting_description_flags() {
    stockpile_cmd()
        .args([
            "products",
            "add",
            "--name",
            "Beans",
            "--category",
            "Coffee",
            "--supplier",
            "sup-1",
            "--stock",
            "5",
            "--price",
            "9.5",
            "--cost",
            "4.0",
            "--description",
            "text",
            "--draft-description",
        ])
        .assert()
        .failure()
        .code(2);
}
