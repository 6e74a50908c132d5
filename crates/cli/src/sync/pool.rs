// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Worker pool that joins every thread when dropped.
//!
//! Jobs travel over a crossbeam MPMC channel, so each worker holds its own
//! clone of the receiver; no shared `Arc<Mutex<Receiver>>` is needed.

use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::{Condvar, Mutex};

struct Job(Box<dyn FnOnce() + Send + 'static>);

/// Count of submitted-but-unfinished jobs, shared with the workers so
/// [`WorkerPool::join`] can wait for it to drain.
#[derive(Debug, Default)]
struct Inflight {
    count: Mutex<usize>,
    drained: Condvar,
}

impl Inflight {
    fn submitted(&self) {
        *self.count.lock() += 1;
    }

    fn finished(&self) {
        let mut count = self.count.lock();
        *count -= 1;
        self.drained.notify_all();
    }

    fn wait_drained(&self) {
        let mut count = self.count.lock();
        while *count != 0 {
            self.drained.wait(&mut count);
        }
    }
}

#[derive(Debug)]
struct Worker {
    _id: usize,
    handle: Option<thread::JoinHandle<()>>,
}

impl Drop for Worker {
    /// Joins the worker thread; a panicked worker re-panics here so the
    /// failure is not silently detached.
    // Panic propagation is the contract of this Drop.
    #[allow(clippy::unwrap_used)]
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.join().unwrap();
        }
    }
}

/// Fixed-size worker pool.
#[derive(Debug)]
pub struct WorkerPool {
    // Field order matters: the sender must drop before the workers so they
    // observe the closed channel and exit their receive loops.
    submit: Sender<Job>,
    workers: Vec<Worker>,
    inflight: Arc<Inflight>,
}

impl WorkerPool {
    /// Create a pool with `size` worker threads.
    ///
    /// # Panics
    ///
    /// Panics if `size` is 0.
    pub fn new(size: usize) -> Self {
        assert!(size > 0);

        let (submit, jobs) = unbounded::<Job>();
        let inflight = Arc::new(Inflight::default());

        let workers = (0..size)
            .map(|id| {
                let jobs: Receiver<Job> = jobs.clone();
                let inflight = Arc::clone(&inflight);
                let handle = thread::spawn(move || {
                    while let Ok(job) = jobs.recv() {
                        job.0();
                        inflight.finished();
                    }
                });
                Worker {
                    _id: id,
                    handle: Some(handle),
                }
            })
            .collect();

        Self {
            submit,
            workers,
            inflight,
        }
    }

    /// Submit a job to the pool.
    pub fn execute<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.inflight.submitted();
        if self.submit.send(Job(Box::new(job))).is_err() {
            // Every worker is gone (all panicked); drop will surface that.
            self.inflight.finished();
        }
    }

    /// Block until every submitted job has finished.
    ///
    /// This waits on the job count, not on the worker threads; the pool is
    /// reusable afterwards.
    pub fn join(&self) {
        self.inflight.wait_drained();
    }

    /// Number of worker threads.
    pub fn size(&self) -> usize {
        self.workers.len()
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
