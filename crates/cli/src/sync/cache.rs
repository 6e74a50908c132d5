// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Key/value cache that computes each entry at most once.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;

/// Cache that remembers the result for each key.
///
/// Each map entry is its own lock: a slot holding `None` is write-locked by
/// the thread currently computing that key's value, so waiters for the same
/// key block on the slot while other keys proceed through the outer map
/// untouched.
#[derive(Debug)]
pub struct Cache<K, V> {
    entries: RwLock<HashMap<K, Arc<RwLock<Option<V>>>>>,
}

impl<K, V> Default for Cache<K, V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Cache<K, V> {
    /// Retrieve the value for `key`, computing it with `init` on first use.
    ///
    /// `init` runs at most once per key, even under concurrent calls for the
    /// same key; calls for distinct keys never serialize each other's `init`.
    // An initializer that panics poisons its key: later callers for that key
    // observe the empty slot and panic too, matching the poisoned-lock
    // behavior this cache replaces.
    #[allow(clippy::expect_used)]
    pub fn get_or_insert_with<F: FnOnce(K) -> V>(&self, key: K, init: F) -> V {
        // Fast path: the slot already exists. Blocks only if the value is
        // still being computed.
        let existing = self.entries.read().get(&key).cloned();
        if let Some(slot) = existing {
            return slot
                .read()
                .as_ref()
                .expect("cache initializer panicked for this key")
                .clone();
        }

        // Slow path: publish an empty slot while holding its write lock, so
        // racers block on the slot rather than on the whole map.
        let slot = Arc::new(RwLock::new(None));
        let mut computing = slot.write();
        {
            let mut entries = self.entries.write();
            match entries.entry(key.clone()) {
                Entry::Occupied(occupied) => {
                    // Lost the race: wait on the winner's slot instead.
                    let winner = Arc::clone(occupied.get());
                    drop(entries);
                    return winner
                        .read()
                        .as_ref()
                        .expect("cache initializer panicked for this key")
                        .clone();
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(Arc::clone(&slot));
                }
            }
        }

        let value = init(key);
        *computing = Some(value.clone());
        value
    }

    /// Number of cached (or in-flight) keys.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True if nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
