//! Test helpers for behavioral specifications.
//!
//! Provides a small DSL for driving the weft binary against throwaway
//! project directories.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub use assert_cmd::prelude::*;
pub use predicates;
pub use predicates::prelude::PredicateBooleanExt;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// Returns a Command configured to run the weft binary.
pub fn weft_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("weft"));
    // Keep the host environment from leaking into config resolution.
    cmd.env_remove("WEFT_CONFIG").env_remove("WEFT_CARGO");
    cmd
}

/// Creates a throwaway project directory with the given weft.toml.
pub fn project(config: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("weft.toml"), config).unwrap();
    // A .git marker keeps discovery from escaping the temp dir.
    fs::create_dir(dir.path().join(".git")).unwrap();
    dir
}

/// Creates a throwaway directory without any config.
pub fn bare_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join(".git")).unwrap();
    dir
}

/// Writes an executable shell script standing in for the external tool.
#[cfg(unix)]
pub fn stub_tool(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("stub-tool.sh");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}
