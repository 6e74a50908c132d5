// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Lock-free sorted linked list (Harris-style).
//!
//! Removal is two-phase: a node is first marked dead by tagging its own
//! `next` pointer, then unlinked — by the remover if it wins the race,
//! otherwise by whichever later traversal walks past it. Memory is reclaimed
//! through `crossbeam-epoch`, so values returned by reference stay alive for
//! as long as the caller's guard is pinned.
//!
// Allow unsafe_code for epoch-managed pointers.
// Safety justification:
// 1. Every `Shared` dereference happens under a pinned guard, and nodes are
//    freed only via `defer_destroy` after becoming unreachable.
// 2. The mark bit travels on the node's own `next` field, so an unlink CAS
//    on a marked predecessor fails and the traversal restarts.
#![allow(unsafe_code)]

use std::cmp::Ordering as KeyOrdering;
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release, SeqCst};

use crossbeam_epoch::{Atomic, Guard, Owned, Shared};

/// The structure changed under the operation; restart from a fresh cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retry;

/// Tag bit on a node's `next` pointer marking the node logically removed.
const DEAD: usize = 1;

/// One list node. Exposed so containers (the split-ordered map) can hold
/// direct references to interior nodes.
#[derive(Debug)]
pub struct Node<K, V> {
    key: K,
    value: V,
    next: Atomic<Node<K, V>>,
}

impl<K, V> Node<K, V> {
    /// Allocate a detached node.
    pub fn new(key: K, value: V) -> Owned<Self> {
        Owned::new(Self {
            key,
            value,
            next: Atomic::null(),
        })
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    /// Take a detached node apart again.
    pub fn into_parts(node: Owned<Self>) -> (K, V) {
        let node = node.into_box();
        (node.key, node.value)
    }

    /// Cursor over this node's successors.
    pub fn successors<'g>(&'g self, guard: &'g Guard) -> Cursor<'g, K, V> {
        Cursor::new(&self.next, guard)
    }
}

/// Lock-free sorted list.
#[derive(Debug)]
pub struct List<K, V> {
    head: Atomic<Node<K, V>>,
}

/// Traversal position: the link into `curr` plus the loaded pointer.
#[derive(Debug)]
pub struct Cursor<'g, K, V> {
    prev: &'g Atomic<Node<K, V>>,
    curr: Shared<'g, Node<K, V>>,
}

// Manual impls: `Shared` and the link reference copy regardless of K and V.
impl<K, V> Clone for Cursor<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for Cursor<'_, K, V> {}

impl<'g, K, V> Cursor<'g, K, V> {
    /// Start a cursor at an arbitrary link.
    pub fn new(link: &'g Atomic<Node<K, V>>, guard: &'g Guard) -> Self {
        Self {
            prev: link,
            curr: link.load(Acquire, guard),
        }
    }

    /// The node the cursor is parked on.
    pub fn current(&self) -> Shared<'g, Node<K, V>> {
        self.curr
    }

    /// The current node's value, if the cursor is on a node.
    pub fn value(&self) -> Option<&'g V> {
        // SAFETY: `curr` was loaded under `guard` and is protected by it.
        unsafe { self.curr.as_ref() }.map(|node| &node.value)
    }
}

impl<'g, K: Ord, V> Cursor<'g, K, V> {
    /// Advance to the first live node whose key is >= `key`, unlinking any
    /// run of dead nodes passed on the way. `Ok(found)` tells whether that
    /// node holds `key`; `Err(Retry)` means an unlink CAS lost a race.
    pub fn find(&mut self, key: &K, guard: &'g Guard) -> Result<bool, Retry> {
        // Where the current unmarked run began, for unlinking.
        let mut run_start = self.curr;

        let found = loop {
            let Some(curr_node) = (unsafe { self.curr.as_ref() }) else {
                break false;
            };
            let next = curr_node.next.load(Acquire, guard);
            if next.tag() == DEAD {
                // Dead node: step over it without moving `prev`.
                self.curr = next.with_tag(0);
                continue;
            }
            match curr_node.key.cmp(key) {
                KeyOrdering::Less => {
                    self.prev = &curr_node.next;
                    self.curr = next;
                    run_start = next;
                }
                KeyOrdering::Equal => break true,
                KeyOrdering::Greater => break false,
            }
        };

        if run_start == self.curr {
            return Ok(found);
        }

        // Unlink the dead run [run_start, curr). Failure means `prev` moved
        // or was itself marked; the caller restarts.
        self.prev
            .compare_exchange(run_start, self.curr, Release, Relaxed, guard)
            .map_err(|_| Retry)?;

        let mut dead = run_start;
        while dead != self.curr {
            // SAFETY: each dead node is now unreachable; destroy after the
            // current epoch.
            let next = unsafe { dead.deref() }.next.load(Relaxed, guard);
            unsafe { guard.defer_destroy(dead) };
            dead = next.with_tag(0);
        }

        Ok(found)
    }

    /// Splice `node` in before the current node. On CAS failure the node is
    /// handed back for the caller to retry with.
    pub fn insert(
        &mut self,
        mut node: Owned<Node<K, V>>,
        guard: &'g Guard,
    ) -> Result<(), Owned<Node<K, V>>> {
        node.next = Atomic::from(self.curr);
        match self
            .prev
            .compare_exchange(self.curr, node, Release, Relaxed, guard)
        {
            Ok(inserted) => {
                self.curr = inserted;
                Ok(())
            }
            Err(err) => Err(err.new),
        }
    }

    /// Remove the current node. Marks it dead, then unlinks it if this
    /// thread wins; a loser that merely fails the unlink leaves the node for
    /// a later traversal. `Err(Retry)` means another thread already marked
    /// the node (or the cursor is past the end).
    pub fn remove(&mut self, guard: &'g Guard) -> Result<&'g V, Retry> {
        let curr_node = unsafe { self.curr.as_ref() }.ok_or(Retry)?;

        // Logical removal: set the mark on the outgoing link.
        let next = curr_node.next.fetch_or(DEAD, SeqCst, guard);
        if next.tag() == DEAD {
            return Err(Retry);
        }

        // Best-effort physical unlink.
        if self
            .prev
            .compare_exchange(self.curr, next.with_tag(0), Release, Relaxed, guard)
            .is_ok()
        {
            // SAFETY: unlinked and unreachable once the epoch turns over.
            unsafe { guard.defer_destroy(self.curr) };
        }

        Ok(&curr_node.value)
    }
}

impl<K, V> List<K, V> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            head: Atomic::null(),
        }
    }

    /// Cursor at the front of the list.
    pub fn head<'g>(&'g self, guard: &'g Guard) -> Cursor<'g, K, V> {
        Cursor::new(&self.head, guard)
    }
}

impl<K: Ord, V> List<K, V> {
    /// Look up `key`, retrying internally until the traversal is clean.
    pub fn lookup<'g>(&'g self, key: &K, guard: &'g Guard) -> Option<&'g V> {
        loop {
            let mut cursor = self.head(guard);
            match cursor.find(key, guard) {
                Ok(true) => return cursor.value(),
                Ok(false) => return None,
                Err(Retry) => {}
            }
        }
    }

    /// Insert a key/value pair; hands the pair back if the key exists.
    pub fn insert(&self, key: K, value: V, guard: &Guard) -> Result<(), (K, V)> {
        let mut node = Node::new(key, value);
        loop {
            let mut cursor = self.head(guard);
            match cursor.find(&node.key, guard) {
                Err(Retry) => {}
                Ok(true) => return Err(Node::into_parts(node)),
                Ok(false) => match cursor.insert(node, guard) {
                    Ok(()) => return Ok(()),
                    Err(lost) => node = lost,
                },
            }
        }
    }

    /// Remove `key`, returning its value (alive while `guard` is pinned).
    pub fn remove<'g>(&'g self, key: &K, guard: &'g Guard) -> Option<&'g V> {
        loop {
            let mut cursor = self.head(guard);
            match cursor.find(key, guard) {
                Err(Retry) => {}
                Ok(false) => return None,
                Ok(true) => match cursor.remove(guard) {
                    Ok(value) => return Some(value),
                    Err(Retry) => {}
                },
            }
        }
    }
}

impl<K, V> Drop for List<K, V> {
    fn drop(&mut self) {
        // SAFETY: `&mut self` rules out concurrent access; dead-but-linked
        // nodes are still reachable here and reclaimed like live ones.
        let guard = unsafe { crossbeam_epoch::unprotected() };
        let mut curr = self.head.load(Relaxed, guard);
        while !curr.is_null() {
            let node = unsafe { curr.with_tag(0).into_owned() }.into_box();
            curr = node.next.load(Relaxed, guard);
        }
    }
}

impl<K, V> Default for List<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "list_tests.rs"]
mod tests;
