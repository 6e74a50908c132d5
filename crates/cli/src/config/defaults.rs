// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized default values for configuration.
//!
//! All default values are documented here for easy reference.
//! `ModelConfig` delegates to these constants via serde `default` attributes.

/// Defaults for the model-test invocation.
pub mod model {
    /// External tool to invoke.
    pub const TOOL: &str = "cargo";

    /// How often the tool persists its checkpoint (tool-defined units).
    pub const CHECKPOINT_INTERVAL: u64 = 1;

    /// Where the tool persists its checkpoint. The file's format belongs to
    /// the tool; weft never reads it.
    pub const CHECKPOINT_FILE: &str = "my_test.json";

    /// Model-checked runs are serialized by default.
    pub const TEST_THREADS: usize = 1;

    /// Optimized builds by default: model checking is compute-bound.
    pub const RELEASE: bool = true;

    /// Unbuffered output by default, so progress is visible mid-run.
    pub const NOCAPTURE: bool = true;
}
