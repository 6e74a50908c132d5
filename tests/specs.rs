//! Behavioral specifications for the weft CLI.
//!
//! These tests are black-box: they invoke the binary and verify stdout,
//! stderr, and exit codes.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

use std::fs;

use prelude::*;

// =============================================================================
// CLI BASICS
// =============================================================================

#[test]
fn help_exits_successfully() {
    weft_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains("weft"));
}

#[test]
fn version_exits_successfully() {
    weft_cmd().arg("--version").assert().success();
}

#[test]
fn model_help_documents_dry_run() {
    weft_cmd()
        .args(["model", "--help"])
        .assert()
        .success()
        .stdout(predicates::str::contains("--dry-run"));
}

// =============================================================================
// MODEL: DRY RUN
// =============================================================================

#[test]
fn dry_run_without_config_uses_defaults() {
    let dir = bare_project();
    weft_cmd()
        .args(["model", "--dry-run"])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicates::str::contains("LOOM_CHECKPOINT_INTERVAL=1"))
        .stdout(predicates::str::contains(
            "LOOM_CHECKPOINT_FILE=my_test.json",
        ))
        .stdout(predicates::str::contains("cargo test"))
        .stdout(predicates::str::contains("--test-threads 1"));
}

#[test]
fn dry_run_renders_suite_invocation() {
    let dir = project(
        r#"
        [model]
        features = ["check-loom"]
        target = "my_test"

        [suite.count_sync]
        filter = "correctness::count_sync"
        "#,
    );
    weft_cmd()
        .args(["model", "count_sync", "--dry-run"])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicates::str::contains(
            "cargo test --features check-loom --release --test my_test \
             correctness::count_sync -- --nocapture --test-threads 1",
        ));
}

#[test]
fn dry_run_flags_override_config() {
    let dir = project("[model]\ncheckpoint_interval = 3\n");
    weft_cmd()
        .args(["model", "--dry-run", "--interval", "42", "--debug"])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicates::str::contains("LOOM_CHECKPOINT_INTERVAL=42"))
        .stdout(predicates::str::contains("--release").not());
}

#[test]
fn unknown_suite_fails_with_message() {
    let dir = project("[suite.known]\n");
    weft_cmd()
        .args(["model", "missing", "--dry-run"])
        .current_dir(dir.path())
        .assert()
        .code(2)
        .stderr(predicates::str::contains("unknown suite `missing`"));
}

#[test]
fn explicit_config_flag_wins_over_discovery() {
    let dir = bare_project();
    let other = dir.path().join("other.toml");
    fs::write(&other, "[model]\ncheckpoint_interval = 77\n").unwrap();
    weft_cmd()
        .args(["model", "--dry-run"])
        .arg("--config")
        .arg(&other)
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicates::str::contains("LOOM_CHECKPOINT_INTERVAL=77"));
}

// =============================================================================
// MODEL: LAUNCHING
// =============================================================================

#[cfg(unix)]
#[test]
fn child_exit_code_is_propagated() {
    let dir = bare_project();
    let tool = stub_tool(dir.path(), "exit 7");
    weft_cmd()
        .args(["model", "--tool"])
        .arg(&tool)
        .current_dir(dir.path())
        .assert()
        .code(7);
}

#[cfg(unix)]
#[test]
fn child_success_exits_zero() {
    let dir = bare_project();
    let tool = stub_tool(dir.path(), "exit 0");
    weft_cmd()
        .args(["model", "--tool"])
        .arg(&tool)
        .current_dir(dir.path())
        .assert()
        .success();
}

#[cfg(unix)]
#[test]
fn child_sees_checkpoint_environment() {
    let dir = bare_project();
    let tool = stub_tool(
        dir.path(),
        "printf '%s %s' \"$LOOM_CHECKPOINT_INTERVAL\" \"$LOOM_CHECKPOINT_FILE\" > observed.txt",
    );
    weft_cmd()
        .args(["model", "--interval", "9", "--checkpoint-file", "ck.json"])
        .arg("--tool")
        .arg(&tool)
        .current_dir(dir.path())
        .assert()
        .success();
    let observed = fs::read_to_string(dir.path().join("observed.txt")).unwrap();
    assert_eq!(observed, "9 ck.json");
}

#[cfg(unix)]
#[test]
fn child_receives_constructed_argv() {
    let dir = bare_project();
    let tool = stub_tool(dir.path(), "printf '%s\\n' \"$@\" > argv.txt");
    weft_cmd()
        .args(["model", "--target", "my_test", "--filter", "correctness::count_sync"])
        .arg("--tool")
        .arg(&tool)
        .current_dir(dir.path())
        .assert()
        .success();
    let argv = fs::read_to_string(dir.path().join("argv.txt")).unwrap();
    let lines: Vec<&str> = argv.lines().collect();
    assert_eq!(
        lines,
        [
            "test",
            "--release",
            "--test",
            "my_test",
            "correctness::count_sync",
            "--",
            "--nocapture",
            "--test-threads",
            "1",
        ]
    );
}

#[cfg(unix)]
#[test]
fn tool_env_var_selects_tool() {
    let dir = bare_project();
    let tool = stub_tool(dir.path(), "exit 5");
    weft_cmd()
        .arg("model")
        .env("WEFT_CARGO", &tool)
        .current_dir(dir.path())
        .assert()
        .code(5);
}

#[test]
fn missing_tool_reports_launch_failure() {
    let dir = bare_project();
    weft_cmd()
        .args(["model", "--tool", "/definitely/not/a/tool"])
        .current_dir(dir.path())
        .assert()
        .code(2)
        .stderr(predicates::str::contains("failed to launch"));
}

// =============================================================================
// INIT
// =============================================================================

#[test]
fn init_writes_config() {
    let dir = bare_project();
    weft_cmd()
        .arg("init")
        .current_dir(dir.path())
        .assert()
        .success();
    let written = fs::read_to_string(dir.path().join("weft.toml")).unwrap();
    assert!(written.contains("[model]"));
}

#[test]
fn init_refuses_to_overwrite() {
    let dir = project("[model]\ncheckpoint_interval = 3\n");
    weft_cmd()
        .arg("init")
        .current_dir(dir.path())
        .assert()
        .code(2)
        .stderr(predicates::str::contains("already exists"));
    // The existing config is untouched.
    let kept = fs::read_to_string(dir.path().join("weft.toml")).unwrap();
    assert!(kept.contains("checkpoint_interval = 3"));
}

#[test]
fn init_force_overwrites() {
    let dir = project("[model]\ncheckpoint_interval = 3\n");
    weft_cmd()
        .args(["init", "--force"])
        .current_dir(dir.path())
        .assert()
        .success();
    let written = fs::read_to_string(dir.path().join("weft.toml")).unwrap();
    assert!(!written.contains("checkpoint_interval = 3"));
}

#[test]
fn initialized_config_round_trips_through_model() {
    let dir = bare_project();
    weft_cmd()
        .arg("init")
        .current_dir(dir.path())
        .assert()
        .success();
    weft_cmd()
        .args(["model", "--dry-run"])
        .current_dir(dir.path())
        .assert()
        .success();
}
