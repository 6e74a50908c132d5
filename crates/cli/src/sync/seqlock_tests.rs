// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Unit tests for the sequence lock.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
// Optimistic read sections on a plain usize: the value is only trusted
// after a successful validate or upgrade.
#![allow(unsafe_code)]

use std::thread;

use super::*;

#[test]
fn write_guard_mutates() {
    let lock = SeqLock::new(1u64);
    {
        let mut guard = lock.write_lock();
        *guard = 2;
    }
    let mut lock = lock;
    assert_eq!(*lock.get_mut(), 2);
}

#[test]
fn into_inner_returns_data() {
    let lock = SeqLock::new("hello".to_string());
    assert_eq!(lock.into_inner(), "hello");
}

#[test]
fn quiet_read_validates() {
    let lock = SeqLock::new(7u64);
    let guard = unsafe { lock.read_lock() };
    let value = *guard;
    assert!(guard.validate());
    assert_eq!(value, 7);
}

#[test]
fn intervening_writer_invalidates_reader() {
    let lock = SeqLock::new(7u64);
    let guard = unsafe { lock.read_lock() };
    {
        let mut writer = lock.write_lock();
        *writer = 8;
    }
    assert!(!guard.validate());
}

#[test]
fn upgrade_succeeds_when_quiet() {
    let lock = SeqLock::new(7u64);
    let guard = unsafe { lock.read_lock() };
    let mut writer = guard.upgrade().unwrap_or_else(|_| panic!("upgrade failed"));
    *writer = 8;
    drop(writer);
    let mut lock = lock;
    assert_eq!(*lock.get_mut(), 8);
}

#[test]
fn upgrade_fails_after_writer() {
    let lock = SeqLock::new(7u64);
    let guard = unsafe { lock.read_lock() };
    {
        let mut writer = lock.write_lock();
        *writer = 8;
    }
    assert!(guard.upgrade().is_err());
}

#[test]
fn writers_serialize() {
    const THREADS: u64 = 8;
    const PER_THREAD: u64 = 1_000;

    let lock = SeqLock::new(0u64);
    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                for _ in 0..PER_THREAD {
                    let mut guard = lock.write_lock();
                    *guard += 1;
                }
            });
        }
    });
    let mut lock = lock;
    assert_eq!(*lock.get_mut(), THREADS * PER_THREAD);
}

#[test]
fn validated_reads_see_consistent_pairs() {
    // Writers keep the two halves equal; a validated read never observes
    // them apart.
    let lock = SeqLock::new((0u64, 0u64));
    thread::scope(|s| {
        s.spawn(|| {
            for i in 1..=1_000u64 {
                let mut guard = lock.write_lock();
                *guard = (i, i);
            }
        });
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..1_000 {
                    let guard = unsafe { lock.read_lock() };
                    let (a, b) = *guard;
                    if guard.validate() {
                        assert_eq!(a, b);
                    }
                }
            });
        }
    });
}
