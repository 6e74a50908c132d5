// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Concurrent building blocks with a checkpointed model-test harness.
//!
//! The library half provides the concurrency toolkit: worker pool,
//! once-per-key cache, sequence lock, concurrent ordered sets, a lock-free
//! list, a split-ordered hash map, and behavior-oriented concurrency
//! (cowns). The binary half (`weft`) drives checkpointed model-test runs of
//! that toolkit by invoking an external test tool with the right flags and
//! environment.

pub mod cli;
pub mod cmd_init;
pub mod cmd_model;
pub mod config;
pub mod cown;
pub mod discovery;
pub mod invoke;
pub mod list;
pub mod map;
pub mod set;
pub mod sync;

#[cfg(test)]
pub mod test_utils;
