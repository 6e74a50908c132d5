// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sorted singly linked list with fine-grained lock coupling.
//!
// Allow unsafe_code for the raw-pointer links.
// Safety justification:
// 1. Every node pointer is owned by exactly one `next` link (or the head).
// 2. A link is only read or written while its mutex is held, and traversal
//    locks hand-over-hand, so no link is ever observed mid-update.
// 3. Nodes are allocated with Box::into_raw and freed exactly once, either
//    by `remove` or by `Drop`.
#![allow(unsafe_code)]

use std::cmp::Ordering;
use std::ptr;

use parking_lot::{Mutex, MutexGuard};

use crate::set::ConcurrentSet;

#[derive(Debug)]
struct Node<T> {
    item: T,
    next: Mutex<*mut Node<T>>,
}

impl<T> Node<T> {
    fn alloc(item: T, next: *mut Self) -> *mut Self {
        Box::into_raw(Box::new(Self {
            item,
            next: Mutex::new(next),
        }))
    }
}

/// Concurrent sorted set over a linked list, locking hand-over-hand.
///
/// Writers and readers lock at most two links at a time, so operations on
/// disjoint regions of the list proceed in parallel.
#[derive(Debug)]
pub struct LockCouplingSet<T> {
    head: Mutex<*mut Node<T>>,
}

// SAFETY: the list owns its nodes; all access to links goes through their
// mutexes.
unsafe impl<T: Send> Send for LockCouplingSet<T> {}
unsafe impl<T: Send> Sync for LockCouplingSet<T> {}

/// Guard over the link that points at the current node. For `head -> 1 -> 2`
/// with the cursor at node 2, the guard is held on node 1's `next`.
struct Cursor<'l, T>(MutexGuard<'l, *mut Node<T>>);

impl<T: Ord> Cursor<'_, T> {
    /// Advance hand-over-hand to the first node whose item is >= `item`.
    /// Returns whether that node holds `item`.
    fn seek(&mut self, item: &T) -> bool {
        loop {
            let Some(node) = (unsafe { self.0.as_ref() }) else {
                return false;
            };
            match node.item.cmp(item) {
                Ordering::Less => {
                    let next = node.next.lock();
                    self.0 = next;
                }
                Ordering::Equal => return true,
                Ordering::Greater => return false,
            }
        }
    }
}

impl<T> LockCouplingSet<T> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            head: Mutex::new(ptr::null_mut()),
        }
    }
}

impl<T: Ord> LockCouplingSet<T> {
    /// Position a cursor at `item`'s place in the sorted order.
    fn locate(&self, item: &T) -> (bool, Cursor<'_, T>) {
        let mut cursor = Cursor(self.head.lock());
        let found = cursor.seek(item);
        (found, cursor)
    }
}

impl<T: Ord> ConcurrentSet<T> for LockCouplingSet<T> {
    fn contains(&self, item: &T) -> bool {
        self.locate(item).0
    }

    fn insert(&self, item: T) -> bool {
        let (found, mut cursor) = self.locate(&item);
        if found {
            return false;
        }
        // The cursor's guard holds the link where `item` belongs.
        let next = *cursor.0;
        *cursor.0 = Node::alloc(item, next);
        true
    }

    fn remove(&self, item: &T) -> bool {
        let (found, mut cursor) = self.locate(item);
        if !found {
            return false;
        }
        // SAFETY: the guard owns the link to this node, so no other thread
        // can reach it; we take ownership back from the raw pointer.
        let node = unsafe { Box::from_raw(*cursor.0) };
        *cursor.0 = *node.next.lock();
        true
    }
}

/// Iterator holding a lock on the link to its current node.
#[derive(Debug)]
pub struct Iter<'l, T> {
    cursor: MutexGuard<'l, *mut Node<T>>,
}

impl<T> LockCouplingSet<T> {
    /// Visit the elements in sorted order. The iterator locks hand-over-hand,
    /// so concurrent writers behind it proceed freely.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            cursor: self.head.lock(),
        }
    }
}

impl<'l, T> Iterator for Iter<'l, T> {
    type Item = &'l T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = unsafe { self.cursor.as_ref() }?;
        self.cursor = node.next.lock();
        Some(&node.item)
    }
}

impl<T> Drop for LockCouplingSet<T> {
    fn drop(&mut self) {
        // Nodes were leaked from Box::into_raw; walk the list and reclaim.
        let mut curr = *self.head.lock();
        while !curr.is_null() {
            // SAFETY: `&mut self` rules out concurrent access; each node is
            // reclaimed exactly once.
            let node = unsafe { Box::from_raw(curr) };
            curr = *node.next.lock();
        }
    }
}

impl<T> Default for LockCouplingSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "lock_coupling_tests.rs"]
mod tests;
