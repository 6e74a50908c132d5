// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Unit tests for the lock-free sorted list.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::thread;

use crossbeam_epoch::pin;

use super::*;

#[test]
fn insert_lookup_remove() {
    let list = List::new();
    let guard = pin();

    assert!(list.insert(3, "three", &guard).is_ok());
    assert_eq!(list.lookup(&3, &guard), Some(&"three"));
    assert_eq!(list.remove(&3, &guard), Some(&"three"));
    assert_eq!(list.lookup(&3, &guard), None);
}

#[test]
fn duplicate_insert_hands_pair_back() {
    let list = List::new();
    let guard = pin();

    assert!(list.insert(1, 10, &guard).is_ok());
    assert_eq!(list.insert(1, 11, &guard), Err((1, 11)));
    // The original mapping survives.
    assert_eq!(list.lookup(&1, &guard), Some(&10));
}

#[test]
fn remove_absent_is_none() {
    let list: List<i32, i32> = List::new();
    let guard = pin();
    assert_eq!(list.remove(&9, &guard), None);
}

#[test]
fn removed_value_stays_alive_under_guard() {
    let list = List::new();
    let guard = pin();
    list.insert(1, "payload".to_string(), &guard).unwrap();

    let value = list.remove(&1, &guard).unwrap();
    // The node is logically gone but the reference is still protected.
    assert_eq!(list.lookup(&1, &guard), None);
    assert_eq!(value, "payload");
}

#[test]
fn keys_keep_sorted_semantics() {
    let list = List::new();
    let guard = pin();
    for key in [5, 1, 4, 2, 3] {
        list.insert(key, key * 10, &guard).unwrap();
    }
    for key in 1..=5 {
        assert_eq!(list.lookup(&key, &guard), Some(&(key * 10)));
    }
}

#[test]
fn concurrent_disjoint_inserts() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 200;

    let list = List::new();
    thread::scope(|s| {
        for t in 0..THREADS {
            let list = &list;
            s.spawn(move || {
                let guard = pin();
                for i in 0..PER_THREAD {
                    let key = t * PER_THREAD + i;
                    assert!(list.insert(key, key, &guard).is_ok());
                }
            });
        }
    });

    let guard = pin();
    for key in 0..THREADS * PER_THREAD {
        assert_eq!(list.lookup(&key, &guard), Some(&key));
    }
}

#[test]
fn concurrent_remove_each_key_once() {
    const KEYS: usize = 500;

    let list = List::new();
    {
        let guard = pin();
        for key in 0..KEYS {
            list.insert(key, key, &guard).unwrap();
        }
    }

    // Two threads race to remove every key; each key must be removed by
    // exactly one of them.
    let counts: Vec<usize> = thread::scope(|s| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let list = &list;
                s.spawn(move || {
                    let mut removed = 0;
                    let guard = pin();
                    for key in 0..KEYS {
                        if list.remove(&key, &guard).is_some() {
                            removed += 1;
                        }
                    }
                    removed
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(counts.iter().sum::<usize>(), KEYS);
    let guard = pin();
    for key in 0..KEYS {
        assert_eq!(list.lookup(&key, &guard), None);
    }
}

#[test]
fn mixed_insert_remove_lookup_churn() {
    let list = List::new();

    thread::scope(|s| {
        let list = &list;
        s.spawn(move || {
            let guard = pin();
            for key in 0..300 {
                let _ = list.insert(key, key, &guard);
            }
        });
        s.spawn(move || {
            let guard = pin();
            for key in 0..300 {
                let _ = list.remove(&key, &guard);
            }
        });
        s.spawn(move || {
            let guard = pin();
            for key in 0..300 {
                if let Some(value) = list.lookup(&key, &guard) {
                    assert_eq!(*value, key);
                }
            }
        });
    });
}

#[test]
fn drop_reclaims_marked_nodes() {
    // Leave a dead-but-linked node behind: remove marks it, and no later
    // traversal unlinks it before the list drops.
    let list = List::new();
    let guard = pin();
    list.insert(1, "a".to_string(), &guard).unwrap();
    list.insert(2, "b".to_string(), &guard).unwrap();
    list.remove(&2, &guard);
    drop(guard);
    drop(list);
}
