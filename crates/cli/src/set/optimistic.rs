// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sorted singly linked list with optimistic fine-grained locking.
//!
//! Each link is a [`SeqLock`] over an epoch-managed pointer: readers traverse
//! without taking locks and validate afterwards, writers upgrade the one link
//! they need. Removed nodes are reclaimed through `crossbeam-epoch`.
//!
// Allow unsafe_code for the optimistic reads and epoch-managed pointers.
// Safety justification:
// 1. `read_lock` sections only touch the link's `Atomic`, which tolerates
//    races; nothing read is trusted before `validate`/`upgrade` succeeds.
// 2. Node pointers stay valid while the epoch guard is pinned; removal goes
//    through `defer_destroy`.
#![allow(unsafe_code)]

use std::cmp::Ordering;
use std::sync::atomic::Ordering::{Acquire, Relaxed, SeqCst};

use crossbeam_epoch::{Atomic, Guard, Owned, Shared, pin};

use crate::set::ConcurrentSet;
use crate::sync::seqlock::{ReadGuard, SeqLock};

#[derive(Debug)]
struct Node<T> {
    item: T,
    next: SeqLock<Atomic<Node<T>>>,
}

impl<T> Node<T> {
    fn alloc(item: T, next: Shared<'_, Self>) -> Owned<Self> {
        Owned::new(Self {
            item,
            next: SeqLock::new(next.into()),
        })
    }
}

/// Concurrent sorted set with lock-free reads and per-link writer locks.
#[derive(Debug)]
pub struct OptimisticSet<T> {
    head: SeqLock<Atomic<Node<T>>>,
}

// SAFETY: nodes are shared across threads only behind epoch guards and the
// per-link seqlocks.
unsafe impl<T: Send> Send for OptimisticSet<T> {}
unsafe impl<T: Sync> Sync for OptimisticSet<T> {}

/// Traversal position: an optimistic guard on the link into `curr`.
#[derive(Debug)]
struct Cursor<'g, T> {
    prev: ReadGuard<'g, Atomic<Node<T>>>,
    curr: Shared<'g, Node<T>>,
}

/// A writer invalidated the traversal; the caller restarts from the head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invalidated;

impl<'g, T: Ord> Cursor<'g, T> {
    /// Advance to the first node whose item is >= `item`. `Ok(found)` tells
    /// whether that node holds `item`; `Err` means a writer got in the way.
    fn seek(&mut self, item: &T, guard: &'g Guard) -> Result<bool, Invalidated> {
        loop {
            if !self.prev.validate() {
                return Err(Invalidated);
            }
            let Some(curr) = (unsafe { self.curr.as_ref() }) else {
                return Ok(false);
            };
            match curr.item.cmp(item) {
                Ordering::Less => {
                    self.prev = unsafe { curr.next.read_lock() };
                    self.curr = self.prev.load(SeqCst, guard);
                }
                Ordering::Equal => return Ok(true),
                Ordering::Greater => return Ok(false),
            }
        }
    }
}

impl<T> OptimisticSet<T> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            head: SeqLock::new(Atomic::null()),
        }
    }

    fn head_cursor<'g>(&'g self, guard: &'g Guard) -> Cursor<'g, T> {
        // SAFETY: only the `Atomic` link is read before validation.
        let prev = unsafe { self.head.read_lock() };
        let curr = prev.load(Acquire, guard);
        Cursor { prev, curr }
    }
}

impl<T: Ord> ConcurrentSet<T> for OptimisticSet<T> {
    fn contains(&self, item: &T) -> bool {
        let guard = pin();
        loop {
            let mut cursor = self.head_cursor(&guard);
            match cursor.seek(item, &guard) {
                Ok(found) => return found,
                Err(Invalidated) => {}
            }
        }
    }

    fn insert(&self, item: T) -> bool {
        let guard = pin();
        loop {
            let mut cursor = self.head_cursor(&guard);
            match cursor.seek(&item, &guard) {
                Err(Invalidated) => {}
                Ok(true) => return false,
                Ok(false) => {
                    // Upgrading proves the link was stable over the whole
                    // traversal, so splicing in front of `curr` is safe.
                    match cursor.prev.upgrade() {
                        Ok(link) => {
                            link.store(Node::alloc(item, cursor.curr), SeqCst);
                            return true;
                        }
                        Err(_) => {}
                    }
                }
            }
        }
    }

    fn remove(&self, item: &T) -> bool {
        let guard = pin();
        'restart: loop {
            let mut cursor = self.head_cursor(&guard);
            loop {
                if !cursor.prev.validate() {
                    continue 'restart;
                }
                let Some(curr) = (unsafe { cursor.curr.as_ref() }) else {
                    return false;
                };
                match curr.item.cmp(item) {
                    Ordering::Less => {
                        cursor.prev = unsafe { curr.next.read_lock() };
                        cursor.curr = cursor.prev.load(SeqCst, &guard);
                    }
                    Ordering::Greater => return false,
                    Ordering::Equal => {
                        let Ok(link) = cursor.prev.upgrade() else {
                            continue 'restart;
                        };
                        // Write-locking the outgoing link invalidates any
                        // reader parked on this node before it is unlinked.
                        let outgoing = curr.next.write_lock();
                        let next = outgoing.load(SeqCst, &guard);
                        link.store(next, SeqCst);
                        drop(outgoing);
                        drop(link);
                        // SAFETY: the node is unreachable from the list now;
                        // epoch reclamation waits out current readers.
                        unsafe { guard.defer_destroy(cursor.curr) };
                        return true;
                    }
                }
            }
        }
    }
}

/// Iterator that revalidates every hop; yields `Err` when a writer
/// invalidated the walk, in which case the caller restarts.
#[derive(Debug)]
pub struct Iter<'g, T> {
    cursor: Cursor<'g, T>,
    guard: &'g Guard,
}

impl<T> OptimisticSet<T> {
    /// Visit the elements in sorted order without blocking writers.
    pub fn iter<'g>(&'g self, guard: &'g Guard) -> Iter<'g, T> {
        Iter {
            cursor: self.head_cursor(guard),
            guard,
        }
    }
}

impl<'g, T> Iterator for Iter<'g, T> {
    type Item = Result<&'g T, Invalidated>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.cursor.prev.validate() {
            return Some(Err(Invalidated));
        }
        let curr = unsafe { self.cursor.curr.as_ref() }?;
        let next_link = unsafe { curr.next.read_lock() };
        if !next_link.validate() {
            return Some(Err(Invalidated));
        }
        let next = next_link.load(SeqCst, self.guard);
        self.cursor = Cursor {
            prev: next_link,
            curr: next,
        };
        Some(Ok(&curr.item))
    }
}

impl<T> Drop for OptimisticSet<T> {
    fn drop(&mut self) {
        // SAFETY: `&mut self` rules out concurrent access.
        let guard = unsafe { crossbeam_epoch::unprotected() };
        let mut curr = self.head.get_mut().load(Relaxed, guard);
        while !curr.is_null() {
            let mut node = unsafe { curr.into_owned() }.into_box();
            curr = node.next.get_mut().load(Relaxed, guard);
            drop(node);
        }
    }
}

impl<T> Default for OptimisticSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "optimistic_tests.rs"]
mod tests;
