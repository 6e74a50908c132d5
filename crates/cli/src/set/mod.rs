// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Concurrent sorted sets.

pub mod lock_coupling;
pub mod optimistic;

pub use lock_coupling::LockCouplingSet;
pub use optimistic::OptimisticSet;

/// Common interface of the concurrent sorted sets.
pub trait ConcurrentSet<T> {
    /// True if `item` is in the set.
    fn contains(&self, item: &T) -> bool;

    /// Insert `item`; false if it was already present.
    fn insert(&self, item: T) -> bool;

    /// Remove `item`; false if it was not present.
    fn remove(&self, item: &T) -> bool;
}
