// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! weft.toml parsing.
//!
//! The `[model]` table holds the default invocation; `[suite.<name>]` tables
//! are named overrides selected with `weft model <name>`. CLI flags win over
//! both.

pub mod defaults;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::cli::ModelArgs;

/// Top-level weft.toml contents.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Default model-test invocation.
    #[serde(default)]
    pub model: ModelConfig,

    /// Named overrides of the `[model]` table.
    #[serde(default)]
    pub suite: BTreeMap<String, SuiteConfig>,
}

/// A fully resolved model-test invocation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// External tool to invoke.
    #[serde(default = "default_tool")]
    pub tool: String,

    /// Directory to launch the tool from.
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    /// Checkpoint interval, forwarded via the environment.
    #[serde(default = "default_interval")]
    pub checkpoint_interval: u64,

    /// Checkpoint file path, forwarded via the environment.
    #[serde(default = "default_checkpoint_file")]
    pub checkpoint_file: String,

    /// Feature tokens passed as one comma-separated `--features` value.
    #[serde(default)]
    pub features: Vec<String>,

    /// Test target (`--test <name>`); omitted when `None`.
    #[serde(default)]
    pub target: Option<String>,

    /// Free-form test-name filter; trailing positional argument.
    #[serde(default)]
    pub filter: Option<String>,

    /// Worker count inside the test harness.
    #[serde(default = "default_test_threads")]
    pub test_threads: usize,

    /// Optimized build selection.
    #[serde(default = "default_release")]
    pub release: bool,

    /// Suppress output capture inside the test harness.
    #[serde(default = "default_nocapture")]
    pub nocapture: bool,
}

/// Partial override applied on top of `ModelConfig`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteConfig {
    pub tool: Option<String>,
    pub dir: Option<PathBuf>,
    pub checkpoint_interval: Option<u64>,
    pub checkpoint_file: Option<String>,
    pub features: Option<Vec<String>>,
    pub target: Option<String>,
    pub filter: Option<String>,
    pub test_threads: Option<usize>,
    pub release: Option<bool>,
    pub nocapture: Option<bool>,
}

fn default_tool() -> String {
    defaults::model::TOOL.to_string()
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_interval() -> u64 {
    defaults::model::CHECKPOINT_INTERVAL
}

fn default_checkpoint_file() -> String {
    defaults::model::CHECKPOINT_FILE.to_string()
}

fn default_test_threads() -> usize {
    defaults::model::TEST_THREADS
}

fn default_release() -> bool {
    defaults::model::RELEASE
}

fn default_nocapture() -> bool {
    defaults::model::NOCAPTURE
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            tool: default_tool(),
            dir: default_dir(),
            checkpoint_interval: default_interval(),
            checkpoint_file: default_checkpoint_file(),
            features: Vec::new(),
            target: None,
            filter: None,
            test_threads: default_test_threads(),
            release: default_release(),
            nocapture: default_nocapture(),
        }
    }
}

impl Config {
    /// Load and parse a weft.toml file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Resolve the invocation for an optional named suite.
    pub fn resolve(&self, suite: Option<&str>) -> anyhow::Result<ModelConfig> {
        let mut model = self.model.clone();
        if let Some(name) = suite {
            let overrides = self.suite.get(name).ok_or_else(|| {
                anyhow::anyhow!(
                    "unknown suite `{name}` (available: {})",
                    self.suite_names().join(", ")
                )
            })?;
            model.apply_suite(overrides);
        }
        Ok(model)
    }

    fn suite_names(&self) -> Vec<String> {
        self.suite.keys().cloned().collect()
    }
}

impl ModelConfig {
    /// Overlay a named suite's settings.
    pub fn apply_suite(&mut self, suite: &SuiteConfig) {
        if let Some(tool) = &suite.tool {
            self.tool = tool.clone();
        }
        if let Some(dir) = &suite.dir {
            self.dir = dir.clone();
        }
        if let Some(interval) = suite.checkpoint_interval {
            self.checkpoint_interval = interval;
        }
        if let Some(file) = &suite.checkpoint_file {
            self.checkpoint_file = file.clone();
        }
        if let Some(features) = &suite.features {
            self.features = features.clone();
        }
        if let Some(target) = &suite.target {
            self.target = Some(target.clone());
        }
        if let Some(filter) = &suite.filter {
            self.filter = Some(filter.clone());
        }
        if let Some(threads) = suite.test_threads {
            self.test_threads = threads;
        }
        if let Some(release) = suite.release {
            self.release = release;
        }
        if let Some(nocapture) = suite.nocapture {
            self.nocapture = nocapture;
        }
    }

    /// Overlay command-line flags. Flags win over file settings.
    pub fn apply_args(&mut self, args: &ModelArgs) {
        if let Some(tool) = &args.tool {
            self.tool = tool.clone();
        }
        if let Some(dir) = &args.dir {
            self.dir = dir.clone();
        }
        if let Some(interval) = args.interval {
            self.checkpoint_interval = interval;
        }
        if let Some(file) = &args.checkpoint_file {
            self.checkpoint_file = file.clone();
        }
        if let Some(features) = &args.features {
            self.features = features.clone();
        }
        if let Some(target) = &args.target {
            self.target = Some(target.clone());
        }
        if let Some(filter) = &args.filter {
            self.filter = Some(filter.clone());
        }
        if let Some(threads) = args.test_threads {
            self.test_threads = threads;
        }
        if args.release {
            self.release = true;
        }
        if args.debug {
            self.release = false;
        }
        if args.capture {
            self.nocapture = false;
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
