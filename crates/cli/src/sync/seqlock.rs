// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sequence lock: exclusive writers, optimistic lock-free readers.
//!
// Allow unsafe_code for the interior-mutability core.
// Safety justification:
// 1. Writers hold exclusion via the odd/even sequence counter.
// 2. Readers may race with writers; `read_lock` is unsafe and its contract
//    pushes the obligation to tolerate torn reads onto the caller.
// 3. `validate` re-checks the counter behind an acquire fence before the
//    caller may trust anything it read.
#![allow(unsafe_code)]

use std::cell::UnsafeCell;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};
use std::sync::atomic::{AtomicUsize, fence};

use crossbeam_utils::Backoff;

/// A lock with a version counter: even means unlocked, odd means a writer is
/// inside. Readers snapshot the counter, read optimistically, and validate.
pub struct SeqLock<T> {
    seq: AtomicUsize,
    data: UnsafeCell<T>,
}

// SAFETY: the sequence counter serializes writers; readers only get `&T`
// under the `read_lock` contract below.
unsafe impl<T: Send> Send for SeqLock<T> {}
unsafe impl<T: Send + Sync> Sync for SeqLock<T> {}

impl<T> SeqLock<T> {
    /// Creates a new unlocked seqlock.
    pub const fn new(data: T) -> Self {
        Self {
            seq: AtomicUsize::new(0),
            data: UnsafeCell::new(data),
        }
    }

    /// Acquire exclusive write access, spinning out any concurrent writer.
    pub fn write_lock(&self) -> WriteGuard<'_, T> {
        let backoff = Backoff::new();
        loop {
            let seq = self.seq.load(Relaxed);
            if seq & 1 == 0
                && self
                    .seq
                    .compare_exchange(seq, seq.wrapping_add(1), Acquire, Relaxed)
                    .is_ok()
            {
                return WriteGuard { lock: self, seq };
            }
            backoff.snooze();
        }
    }

    /// Begin an optimistic read section.
    ///
    /// # Safety
    ///
    /// Until [`ReadGuard::validate`] returns `true`, a writer may be mutating
    /// the data concurrently. The caller must only perform reads that
    /// tolerate such races (e.g. through atomics) and must not act on a
    /// loaded value before a successful validation.
    pub unsafe fn read_lock(&self) -> ReadGuard<'_, T> {
        let backoff = Backoff::new();
        loop {
            let seq = self.seq.load(Acquire);
            if seq & 1 == 0 {
                return ReadGuard { lock: self, seq };
            }
            backoff.snooze();
        }
    }

    /// Mutable access through exclusive ownership; no locking needed.
    pub fn get_mut(&mut self) -> &mut T {
        // SAFETY: `&mut self` rules out any concurrent access.
        unsafe { &mut *self.data.get() }
    }

    /// Consume the lock, returning the data.
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T> fmt::Debug for SeqLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeqLock")
            .field("seq", &self.seq.load(Relaxed))
            .finish_non_exhaustive()
    }
}

/// Exclusive write access. Dropping the guard releases the lock.
#[derive(Debug)]
pub struct WriteGuard<'s, T> {
    lock: &'s SeqLock<T>,
    /// Counter value before this writer entered (even).
    seq: usize,
}

impl<T> Deref for WriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the odd counter excludes other writers, and readers must
        // validate before trusting anything.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: as above.
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for WriteGuard<'_, T> {
    fn drop(&mut self) {
        // Skip to the next even value, invalidating every outstanding reader.
        self.lock.seq.store(self.seq.wrapping_add(2), Release);
    }
}

/// Optimistic read access. Never blocks writers.
#[derive(Debug)]
pub struct ReadGuard<'s, T> {
    lock: &'s SeqLock<T>,
    /// Counter value observed when the guard was taken (even).
    seq: usize,
}

impl<T> Deref for ReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: covered by the `read_lock` contract.
        unsafe { &*self.lock.data.get() }
    }
}

impl<'s, T> ReadGuard<'s, T> {
    /// True if no writer has intervened since the guard was taken.
    pub fn validate(&self) -> bool {
        fence(Acquire);
        self.lock.seq.load(Relaxed) == self.seq
    }

    /// Try to promote this reader to a writer.
    ///
    /// Succeeds only if no writer intervened since the guard was taken, so a
    /// successful upgrade also proves everything read so far was consistent.
    pub fn upgrade(self) -> Result<WriteGuard<'s, T>, Self> {
        if self
            .lock
            .seq
            .compare_exchange(self.seq, self.seq.wrapping_add(1), Acquire, Relaxed)
            .is_ok()
        {
            Ok(WriteGuard {
                lock: self.lock,
                seq: self.seq,
            })
        } else {
            Err(self)
        }
    }
}

#[cfg(test)]
#[path = "seqlock_tests.rs"]
mod tests;
