// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Lock-free growable array of atomic pointers.
//!
//! A tree of fixed-size segments: inner segments hold pointers to child
//! segments, leaf segments hold the element slots. The root pointer's tag
//! encodes the tree height, so an index that outgrows the current height
//! just pushes new roots on top (the old root becomes child 0, covering the
//! low indices). Slots for an index are allocated on first touch and stay
//! put forever, so a returned `&Atomic<T>` stays valid for the table's life.
//!
//! Dropping the table frees the segments only — the elements belong to
//! whatever container stored them (the split-ordered map's nodes are owned
//! by its list).
//!
// Allow unsafe_code for the untyped segment union.
// Safety justification:
// 1. A segment's role (inner vs leaf) is fixed by its depth, which every
//    access derives from the root tag; the union is never read both ways.
// 2. Zeroed allocation is valid: both variants are arrays of atomic
//    pointers, and all-zero means all-null.
#![allow(unsafe_code)]

use std::fmt;
use std::mem::{self, ManuallyDrop};
use std::sync::atomic::Ordering::{Relaxed, SeqCst};

use crossbeam_epoch::{Atomic, Guard, Owned};

/// log2 of the segment fanout.
const FANOUT_BITS: usize = 10;
const FANOUT: usize = 1 << FANOUT_BITS;
const FANOUT_MASK: usize = FANOUT - 1;

/// A fixed-size array of atomic pointers, either to child segments (inner)
/// or to elements (leaf). Depth decides which; the union itself carries no
/// discriminant.
union Segment<T> {
    children: ManuallyDrop<[Atomic<Segment<T>>; FANOUT]>,
    slots: ManuallyDrop<[Atomic<T>; FANOUT]>,
}

impl<T> Segment<T> {
    fn alloc() -> Owned<Self> {
        // SAFETY: all-zero is all-null for both union variants.
        Owned::new(unsafe { mem::zeroed() })
    }

    /// Free this segment and its descendants, leaving elements alone.
    ///
    /// # Safety
    ///
    /// `height` must be this segment's actual height, and no other reference
    /// to the subtree may remain.
    unsafe fn dealloc(self: Box<Self>, height: usize) {
        if height > 1 {
            // SAFETY: exclusive access; an inner segment's non-null children
            // are valid segments of height - 1.
            let guard = unsafe { crossbeam_epoch::unprotected() };
            for child in unsafe { &self.children }.iter() {
                let child = child.load(Relaxed, guard);
                if child.is_null() {
                    continue;
                }
                unsafe { child.into_owned().into_box().dealloc(height - 1) };
            }
        }
        // The arrays have no drop glue of their own; the box frees the rest.
    }
}

impl<T> fmt::Debug for Segment<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Segment")
    }
}

/// Growable array of `Atomic<T>`, indexed sparsely.
#[derive(Debug)]
pub struct SegmentTable<T> {
    /// Tree root; the pointer tag is the tree height (0 = empty).
    root: Atomic<Segment<T>>,
}

impl<T> SegmentTable<T> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            root: Atomic::null(),
        }
    }

    /// Tree height needed to address `index`.
    fn height_for(index: usize) -> usize {
        let mut height = 1;
        let mut rest = index >> FANOUT_BITS;
        while rest > 0 {
            height += 1;
            rest >>= FANOUT_BITS;
        }
        height
    }

    /// The slot for `index`, allocating segments along the path as needed.
    pub fn get<'g>(&'g self, index: usize, guard: &'g Guard) -> &'g Atomic<T> {
        let needed = Self::height_for(index);

        // Push new roots until the tree is tall enough. The old root covers
        // the low indices, so it becomes child 0 of each new root.
        let mut root = self.root.load(SeqCst, guard);
        while root.tag() < needed {
            let mut segment = Segment::alloc();
            if !root.is_null() {
                // SAFETY: a fresh segment used as inner; slot 0 takes over
                // ownership of the old root if the CAS wins.
                unsafe { segment.children[0] = Atomic::from(root) };
            }
            let segment = segment.with_tag(root.tag() + 1);
            match self
                .root
                .compare_exchange(root, segment, SeqCst, SeqCst, guard)
            {
                Ok(new_root) => root = new_root,
                // Lost to another grower; its root is at least as tall. The
                // failed Owned aliases `root` through child 0, but Segment
                // has no drop glue, so dropping it only frees the segment.
                Err(err) => root = err.current,
            }
        }

        // Descend. Levels above `needed` use child 0 (their index bits are
        // all zero by construction).
        let mut segment = root;
        let mut height = root.tag();
        loop {
            if height == 1 {
                // SAFETY: height 1 means leaf; protected by `guard`.
                let slots = unsafe { &segment.deref().slots };
                return &slots[index & FANOUT_MASK];
            }
            let child_index = (index >> (FANOUT_BITS * (height - 1))) & FANOUT_MASK;
            // SAFETY: height > 1 means inner; protected by `guard`.
            let children = unsafe { &segment.deref().children };
            let link = &children[child_index];
            let mut child = link.load(SeqCst, guard);
            if child.is_null() {
                match link.compare_exchange(child, Segment::alloc(), SeqCst, SeqCst, guard) {
                    Ok(installed) => child = installed,
                    Err(err) => child = err.current,
                }
            }
            segment = child;
            height -= 1;
        }
    }
}

impl<T> Drop for SegmentTable<T> {
    /// Frees the segments, never the elements.
    fn drop(&mut self) {
        // SAFETY: `&mut self` rules out concurrent access.
        let guard = unsafe { crossbeam_epoch::unprotected() };
        let root = self.root.load(Relaxed, guard);
        if root.is_null() {
            return;
        }
        let height = root.tag();
        unsafe { root.into_owned().into_box().dealloc(height) };
    }
}

impl<T> Default for SegmentTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "segment_table_tests.rs"]
mod tests;
