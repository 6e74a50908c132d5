// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Blocking synchronization building blocks.

pub mod cache;
pub mod pool;
pub mod seqlock;

pub use cache::Cache;
pub use pool::WorkerPool;
pub use seqlock::SeqLock;
