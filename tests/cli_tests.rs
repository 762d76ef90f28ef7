//! CLI integration tests
//!
//! Tests the command-line interface using assert_cmd

mod common;

use std::fs;

use common::{digest_cmd, Workspace};
use predicates::prelude::*;

// ─────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_help_flag() {
    digest_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("merge-index"))
        .stdout(predicate::str::contains("gallery"))
        .stdout(predicate::str::contains("export-api"))
        .stdout(predicate::str::contains("personas"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_command() {
    digest_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("persona-digest"))
        .stdout(predicate::str::contains("Git Hash"))
        .stdout(predicate::str::contains("Target"));
}

#[test]
fn test_short_version_flag() {
    digest_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("persona-digest"));
}

#[test]
fn test_unknown_mode_rejected() {
    digest_cmd()
        .args(["generate", "--mode", "random"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("random"));
}

// ─────────────────────────────────────────────────────────────────
// Config Command Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_config_show_sections() {
    let ws = Workspace::new();
    ws.run(&["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[generation]"))
        .stdout(predicate::str::contains("[llm]"))
        .stdout(predicate::str::contains("[aggregate]"))
        .stdout(predicate::str::contains("[publish]"))
        .stdout(predicate::str::contains("[logging]"));
}

#[test]
fn test_config_show_masks_api_key() {
    let ws = Workspace::new();
    ws.run(&["config", "show"])
        .env("PERSONA_DIGEST_API_KEY", "sk-very-secret-value")
        .assert()
        .success()
        .stdout(predicate::str::contains("api_key = \"***\""))
        .stdout(predicate::str::contains("sk-very-secret-value").not());
}

#[test]
fn test_config_validate() {
    let ws = Workspace::new();
    ws.run(&["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn test_config_missing_file_exit_code() {
    digest_cmd()
        .args(["config", "validate", "--config", "/nonexistent/persona-digest.toml"])
        .assert()
        .code(10)
        .stderr(predicate::str::contains("E100"));
}

#[test]
fn test_config_init_and_force() {
    let ws = Workspace::new();
    let path = ws.root().join("fresh/persona-digest.toml");
    let path_arg = path.display().to_string();

    digest_cmd()
        .args(["config", "init", "--path", &path_arg])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration written"));
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("[generation]"));
    assert!(content.contains("api_key = \"\""));

    digest_cmd()
        .args(["config", "init", "--path", &path_arg])
        .assert()
        .code(10)
        .stderr(predicate::str::contains("--force"));

    digest_cmd()
        .args(["config", "init", "--path", &path_arg, "--force"])
        .assert()
        .success();

    digest_cmd()
        .args(["config", "validate", "--config", &path_arg])
        .assert()
        .success();
}
