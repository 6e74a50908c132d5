// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The `weft model` command: resolve configuration, build the invocation,
//! launch, and hand the child's exit code back to `main`.

use std::path::Path;

use anyhow::Context;

use crate::cli::ModelArgs;
use crate::config::{Config, ModelConfig};
use crate::discovery;
use crate::invoke::Invocation;

/// Run the model subcommand. Returns the process exit code.
pub fn run(args: &ModelArgs, config_path: Option<&Path>) -> anyhow::Result<i32> {
    let model = resolve_config(args, config_path)?;
    let invocation = Invocation::from_config(&model);

    if args.dry_run {
        println!("{}", invocation.render());
        return Ok(0);
    }

    let code = invocation.launch()?;
    if code != 0 {
        tracing::debug!("external tool exited with status {code}");
    }
    Ok(code)
}

/// Layer defaults, weft.toml, the selected suite, and CLI flags.
fn resolve_config(args: &ModelArgs, config_path: Option<&Path>) -> anyhow::Result<ModelConfig> {
    let config = match config_path {
        Some(path) => Config::load(path)?,
        None => {
            let cwd = std::env::current_dir().context("failed to resolve current directory")?;
            match discovery::find_config(&cwd) {
                Some(path) => Config::load(&path)?,
                None => Config::default(),
            }
        }
    };

    let mut model = config.resolve(args.suite.as_deref())?;
    model.apply_args(args);
    Ok(model)
}

#[cfg(test)]
#[path = "cmd_model_tests.rs"]
mod tests;
