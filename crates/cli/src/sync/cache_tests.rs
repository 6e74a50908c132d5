// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Unit tests for the once-per-key cache.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering::SeqCst;
use std::thread;

use crossbeam_channel::bounded;

use super::*;

#[test]
fn computes_on_first_use() {
    let cache: Cache<u32, u32> = Cache::default();
    assert_eq!(cache.get_or_insert_with(3, |k| k * 2), 6);
    assert_eq!(cache.len(), 1);
}

#[test]
fn second_call_reuses_cached_value() {
    let cache: Cache<u32, u32> = Cache::default();
    let calls = AtomicUsize::new(0);
    for _ in 0..5 {
        let value = cache.get_or_insert_with(7, |k| {
            calls.fetch_add(1, SeqCst);
            k + 1
        });
        assert_eq!(value, 8);
    }
    assert_eq!(calls.load(SeqCst), 1);
}

#[test]
fn distinct_keys_compute_independently() {
    let cache: Cache<u32, u32> = Cache::default();
    assert_eq!(cache.get_or_insert_with(1, |k| k * 10), 10);
    assert_eq!(cache.get_or_insert_with(2, |k| k * 10), 20);
    assert_eq!(cache.len(), 2);
}

#[test]
fn empty_cache_reports_empty() {
    let cache: Cache<u32, u32> = Cache::default();
    assert!(cache.is_empty());
    cache.get_or_insert_with(1, |_| 0);
    assert!(!cache.is_empty());
}

#[test]
fn concurrent_same_key_initializes_once() {
    let cache: Arc<Cache<u32, u32>> = Arc::new(Cache::default());
    let calls = Arc::new(AtomicUsize::new(0));

    thread::scope(|s| {
        for _ in 0..16 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            s.spawn(move || {
                let value = cache.get_or_insert_with(42, |k| {
                    calls.fetch_add(1, SeqCst);
                    // Widen the race window.
                    thread::sleep(std::time::Duration::from_millis(5));
                    k * 2
                });
                assert_eq!(value, 84);
            });
        }
    });

    assert_eq!(calls.load(SeqCst), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn slow_key_does_not_block_other_keys() {
    let cache: Cache<u32, u32> = Cache::default();
    let (fast_done_tx, fast_done_rx) = bounded::<()>(0);

    // The initializer for key 1 blocks until key 2 has been computed. If
    // distinct keys serialized on one lock, this would deadlock.
    thread::scope(|s| {
        s.spawn(|| {
            let value = cache.get_or_insert_with(1, |_| {
                fast_done_rx.recv().unwrap();
                10
            });
            assert_eq!(value, 10);
        });
        s.spawn(|| {
            // Give the slow initializer a chance to enter first.
            thread::sleep(std::time::Duration::from_millis(20));
            assert_eq!(cache.get_or_insert_with(2, |_| 20), 20);
            fast_done_tx.send(()).unwrap();
        });
    });

    assert_eq!(cache.get_or_insert_with(1, |_| 0), 10);
    assert_eq!(cache.get_or_insert_with(2, |_| 0), 20);
}
