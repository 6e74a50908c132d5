// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Concurrent maps.

pub mod segment_table;
pub mod split_ordered;

pub use segment_table::SegmentTable;
pub use split_ordered::SplitOrderedMap;

use crossbeam_epoch::Guard;

/// Common interface of the concurrent maps. References returned out of the
/// map stay valid while the caller's `guard` is pinned.
pub trait ConcurrentMap<K, V> {
    /// Look up `key`.
    fn lookup<'g>(&'g self, key: &K, guard: &'g Guard) -> Option<&'g V>;

    /// Insert a key/value pair; hands the value back if the key exists.
    fn insert(&self, key: K, value: V, guard: &Guard) -> Result<(), V>;

    /// Remove `key`, returning a reference to its value.
    fn remove<'g>(&'g self, key: &K, guard: &'g Guard) -> Option<&'g V>;
}
