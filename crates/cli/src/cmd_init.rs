// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The `weft init` command: write a commented default weft.toml.

use anyhow::bail;

use crate::cli::InitArgs;

/// Default configuration written by `weft init`.
const DEFAULT_CONFIG: &str = r#"# weft configuration
# The [model] table is the default checkpointed model-test invocation;
# [suite.<name>] tables override it and are selected with `weft model <name>`.

[model]
# checkpoint_interval = 1
# checkpoint_file = "my_test.json"
# features = []
# test_threads = 1
# release = true
# nocapture = true

# [suite.count_sync]
# target = "my_test"
# filter = "correctness::count_sync"
"#;

/// Write weft.toml into the current directory.
pub fn run(args: &InitArgs) -> anyhow::Result<()> {
    let path = std::env::current_dir()?.join("weft.toml");
    if path.exists() && !args.force {
        bail!("weft.toml already exists (use --force to overwrite)");
    }
    std::fs::write(&path, DEFAULT_CONFIG)?;
    println!("wrote {}", path.display());
    Ok(())
}
