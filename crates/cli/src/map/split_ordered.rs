// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Split-ordered hash map (Shalev & Shavit).
//!
//! All entries live in one lock-free sorted [`List`], ordered by their
//! bit-reversed key. Buckets are just shortcuts into that list: bucket `i`
//! is a sentinel node whose split-order key is `reverse(i)` (low bit 0);
//! real items use `reverse(key) | 1` (low bit 1), so a sentinel sorts
//! immediately before the items of its bucket. Doubling the bucket count
//! never moves an entry — each new bucket's sentinel splices in between
//! existing ones, which is the whole trick of the structure.
//!
//! Keys must leave their top bit clear (i.e. `key < 2^63` on 64-bit), so the
//! reversal has room for the sentinel/item bit.
//!
// Allow unsafe_code for dereferencing sentinel pointers.
// Safety justification: sentinels are never removed, so a sentinel loaded
// from the bucket table stays valid for the life of the map; dereferences
// additionally happen under a pinned epoch guard.
#![allow(unsafe_code)]

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering::{Acquire, Relaxed, SeqCst};

use crossbeam_epoch::{Guard, Shared};

use crate::list::{Cursor, List, Node, Retry};
use crate::map::ConcurrentMap;

/// Entry payload: sentinels carry `None`, items carry `Some`.
type Slot<V> = Option<V>;

/// Lock-free map from `usize` keys in `[0, 2^63)` to `V`.
#[derive(Debug)]
pub struct SplitOrderedMap<V> {
    /// Every sentinel and item, in split order.
    entries: List<usize, Slot<V>>,
    /// Bucket index -> sentinel node.
    buckets: SegmentTableOfNodes<V>,
    /// Number of buckets; always a power of two.
    size: AtomicUsize,
    /// Number of items.
    count: AtomicUsize,
}

type SegmentTableOfNodes<V> = crate::map::SegmentTable<Node<usize, Option<V>>>;

/// Buckets double when `count > size * LOAD_FACTOR`.
const LOAD_FACTOR: usize = 2;

/// Split-order key of bucket `index`'s sentinel: low bit 0.
fn sentinel_key(index: usize) -> usize {
    index.reverse_bits()
}

/// Split-order key of an item: low bit 1.
fn item_key(key: usize) -> usize {
    key.reverse_bits() | 1
}

/// The bucket whose sentinel precedes `index`'s sentinel in the list:
/// `index` with its highest set bit cleared.
fn parent_bucket(index: usize) -> usize {
    debug_assert!(index > 0);
    index & !(1 << (usize::BITS - 1 - index.leading_zeros()))
}

impl<V> SplitOrderedMap<V> {
    /// Creates an empty map with two buckets.
    pub fn new() -> Self {
        Self {
            entries: List::new(),
            buckets: SegmentTableOfNodes::new(),
            size: AtomicUsize::new(2),
            count: AtomicUsize::new(0),
        }
    }

    /// Number of items in the map.
    pub fn len(&self) -> usize {
        self.count.load(SeqCst)
    }

    /// True if the map holds no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_key(key: usize) {
        assert!(
            key.leading_zeros() != 0,
            "split-ordered keys must leave the top bit clear"
        );
    }

    /// The sentinel node for `index`, initializing the bucket (and its
    /// ancestors) on first touch.
    fn bucket<'g>(&'g self, index: usize, guard: &'g Guard) -> Shared<'g, Node<usize, Slot<V>>> {
        let slot = self.buckets.get(index, guard);
        let node = slot.load(Acquire, guard);
        if !node.is_null() {
            return node;
        }

        // Find-or-insert the sentinel, starting from the parent bucket so
        // the traversal stays short as the table grows.
        let key = sentinel_key(index);
        let node = loop {
            let mut cursor = self.bucket_start(index, guard);
            match cursor.find(&key, guard) {
                Err(Retry) => {}
                Ok(true) => break cursor.current(),
                Ok(false) => match cursor.insert(Node::new(key, None), guard) {
                    Ok(()) => break cursor.current(),
                    Err(_lost) => {}
                },
            }
        };

        // Publish; a racing initializer found the same sentinel node, so a
        // lost CAS hands back an identical pointer.
        match slot.compare_exchange(Shared::null(), node, SeqCst, Relaxed, guard) {
            Ok(published) => published,
            Err(err) => err.current,
        }
    }

    /// Where a traversal for bucket `index`'s sentinel begins.
    fn bucket_start<'g>(&'g self, index: usize, guard: &'g Guard) -> Cursor<'g, usize, Slot<V>> {
        if index == 0 {
            return self.entries.head(guard);
        }
        let parent = self.bucket(parent_bucket(index), guard);
        // SAFETY: sentinels are never removed.
        unsafe { parent.deref() }.successors(guard)
    }

    /// Position a cursor on `key`'s item via its bucket.
    fn find<'g>(&'g self, key: usize, guard: &'g Guard) -> (bool, Cursor<'g, usize, Slot<V>>) {
        let skey = item_key(key);
        loop {
            let size = self.size.load(SeqCst);
            let sentinel = self.bucket(key & (size - 1), guard);
            // SAFETY: sentinels are never removed.
            let mut cursor = unsafe { sentinel.deref() }.successors(guard);
            match cursor.find(&skey, guard) {
                Ok(found) => return (found, cursor),
                Err(Retry) => {}
            }
        }
    }

    /// Double the bucket count if the load factor is exceeded. Only one
    /// thread wins the resize; new buckets initialize lazily.
    fn maybe_grow(&self) {
        let count = self.count.load(SeqCst);
        let size = self.size.load(SeqCst);
        if count > size * LOAD_FACTOR {
            let _ = self
                .size
                .compare_exchange(size, size * 2, SeqCst, Relaxed);
        }
    }
}

impl<V> ConcurrentMap<usize, V> for SplitOrderedMap<V> {
    fn lookup<'g>(&'g self, key: &usize, guard: &'g Guard) -> Option<&'g V> {
        Self::check_key(*key);

        let (found, cursor) = self.find(*key, guard);
        if !found {
            return None;
        }
        cursor.value().and_then(|slot| slot.as_ref())
    }

    fn insert(&self, key: usize, value: V, guard: &Guard) -> Result<(), V> {
        Self::check_key(key);

        let mut node = Node::new(item_key(key), Some(value));
        loop {
            let (found, mut cursor) = self.find(key, guard);
            if found {
                let (_, slot) = Node::into_parts(node);
                // A freshly built item node always carries a value.
                return Err(slot.unwrap_or_else(|| unreachable!()));
            }
            match cursor.insert(node, guard) {
                Ok(()) => {
                    self.count.fetch_add(1, SeqCst);
                    self.maybe_grow();
                    return Ok(());
                }
                Err(lost) => node = lost,
            }
        }
    }

    fn remove<'g>(&'g self, key: &usize, guard: &'g Guard) -> Option<&'g V> {
        Self::check_key(*key);

        loop {
            let (found, mut cursor) = self.find(*key, guard);
            if !found {
                return None;
            }
            match cursor.remove(guard) {
                Ok(slot) => {
                    self.count.fetch_sub(1, SeqCst);
                    return slot.as_ref();
                }
                // Lost the removal race; reconfirm whether the key is gone.
                Err(Retry) => {}
            }
        }
    }
}

impl<V> Default for SplitOrderedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "split_ordered_tests.rs"]
mod tests;
