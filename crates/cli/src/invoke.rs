// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Child-process invocation of the external test tool.
//!
//! An [`Invocation`] is an immutable argument list plus an environment map,
//! built once from a resolved [`ModelConfig`] and consumed by exactly one
//! launch. The child inherits our stdio; nothing is captured or rewritten.
//! Its exit code is the only result we interpret, and we don't interpret it
//! much: it is propagated verbatim.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use thiserror::Error;

use crate::config::ModelConfig;

/// Environment variable carrying the checkpoint interval to the child.
pub const CHECKPOINT_INTERVAL_VAR: &str = "LOOM_CHECKPOINT_INTERVAL";

/// Environment variable carrying the checkpoint file path to the child.
pub const CHECKPOINT_FILE_VAR: &str = "LOOM_CHECKPOINT_FILE";

/// The external tool could not be started at all.
///
/// A child that starts and exits non-zero is not an error; that status is
/// simply our own exit status.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to launch `{tool}`: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },
}

/// A fully constructed child-process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    dir: PathBuf,
}

impl Invocation {
    /// Build the argument list and environment for a resolved configuration.
    ///
    /// Construction is deterministic: the same configuration always yields
    /// the same argv and environment. Harness flags (`--nocapture`,
    /// `--test-threads`) go after the `--` separator; the filter stays a
    /// trailing tool-level positional.
    pub fn from_config(config: &ModelConfig) -> Self {
        let mut args = vec!["test".to_string()];
        if !config.features.is_empty() {
            args.push("--features".to_string());
            args.push(config.features.join(","));
        }
        if config.release {
            args.push("--release".to_string());
        }
        if let Some(target) = &config.target {
            args.push("--test".to_string());
            args.push(target.clone());
        }
        if let Some(filter) = &config.filter {
            args.push(filter.clone());
        }
        args.push("--".to_string());
        if config.nocapture {
            args.push("--nocapture".to_string());
        }
        args.push("--test-threads".to_string());
        args.push(config.test_threads.to_string());

        let mut env = BTreeMap::new();
        env.insert(
            CHECKPOINT_INTERVAL_VAR.to_string(),
            config.checkpoint_interval.to_string(),
        );
        env.insert(
            CHECKPOINT_FILE_VAR.to_string(),
            config.checkpoint_file.clone(),
        );

        Self {
            program: config.tool.clone(),
            args,
            env,
            dir: config.dir.clone(),
        }
    }

    /// The tool binary to launch.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Tool arguments, in launch order.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Environment variables injected into the child.
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Working directory for the child.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Render as a shell-style line, for logs and `--dry-run`.
    pub fn render(&self) -> String {
        let mut parts: Vec<String> = self
            .env
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        parts.push(self.program.clone());
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }

    /// Launch the child with inherited stdio, block until it exits, and
    /// return its exit code.
    pub fn launch(self) -> Result<i32, LaunchError> {
        tracing::debug!("launching: {}", self.render());
        let status = Command::new(&self.program)
            .args(&self.args)
            .envs(&self.env)
            .current_dir(&self.dir)
            .status()
            .map_err(|source| LaunchError::Spawn {
                tool: self.program.clone(),
                source,
            })?;
        Ok(exit_code(status))
    }
}

/// A child killed by a signal has no code; report generic failure.
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

#[cfg(test)]
#[path = "invoke_tests.rs"]
mod tests;
