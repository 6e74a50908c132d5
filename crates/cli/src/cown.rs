// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Behavior-oriented concurrency: cowns and `when!` blocks.
//!
//! A cown (concurrent owner) wraps a value that may only be touched inside a
//! scheduled behavior. `when!` captures a set of cowns and a thunk; the
//! runtime queues one request per cown (an MCS-style queue hanging off each
//! cown's tail pointer) and runs the thunk on the rayon pool once every
//! request reaches the front of its queue. Requests are enqueued in a global
//! order (cown address) with a two-phase protocol, so overlapping behaviors
//! never deadlock and behaviors touching the same cown run in submission
//! order.
//!
// Allow unsafe_code for the intrusive request queues.
// Safety justification:
// 1. A behavior is leaked at schedule time and reclaimed by the last
//    resolved request; the count field makes that handoff unique.
// 2. A request outlives its behavior's queue linkage: requests live inside
//    the leaked behavior and are only read by the neighbors the MCS
//    protocol hands them to.
// 3. Cown values are only dereferenced inside the thunk, after every
//    involved queue has granted exclusive access.
#![allow(unsafe_code)]

use std::cell::UnsafeCell;
use std::cmp;
use std::fmt;
use std::ptr;
use std::sync::Arc;
use std::sync::atomic::Ordering::{Relaxed, SeqCst};
use std::sync::atomic::{AtomicBool, AtomicPtr, AtomicUsize};

use crossbeam_utils::Backoff;
use rayon::spawn;

/// One cown's slot in a behavior's scheduling.
pub struct Request {
    /// Next behavior waiting on this cown.
    next: AtomicPtr<Behavior>,
    /// Set once this request's behavior finished enqueueing everywhere.
    scheduled: AtomicBool,
    /// The cown this request wants. `Arc`, because every user-facing handle
    /// may be gone while the behavior is still queued.
    target: Arc<dyn CownBase>,
}

// SAFETY: requests never hand out `&T` from the cown, so `Send` on the
// target is all that crossing threads needs.
unsafe impl Send for Request {}

impl Request {
    fn new(target: Arc<dyn CownBase>) -> Request {
        Request {
            next: AtomicPtr::new(ptr::null_mut()),
            scheduled: AtomicBool::new(false),
            target,
        }
    }

    /// Phase one of the two-phase enqueue: swap ourselves in as the cown's
    /// tail, then wait for the previous holder to finish ITS enqueue phase
    /// before linking behind it. Waiting here is what makes the overall
    /// enqueue atomic across all of a behavior's cowns.
    ///
    /// # Safety
    ///
    /// `behavior` must point to the behavior owning `self`, and this must be
    /// the only enqueue of this request.
    unsafe fn start_enqueue(&self, behavior: *const Behavior) {
        let prev = self
            .target
            .tail()
            .swap(self as *const Self as *mut Self, SeqCst);
        let Some(prev) = (unsafe { prev.as_ref() }) else {
            // Queue was empty: this request is immediately at the front.
            unsafe { Behavior::resolve_one(behavior) };
            return;
        };
        let backoff = Backoff::new();
        while !prev.scheduled.load(SeqCst) {
            backoff.snooze();
        }
        prev.next.store(behavior.cast_mut(), SeqCst);
    }

    /// Phase two: mark the request visible so successors may link behind it.
    ///
    /// # Safety
    ///
    /// Every `start_enqueue` of this request's behavior must be complete.
    unsafe fn finish_enqueue(&self) {
        self.scheduled.store(true, SeqCst);
    }

    /// Hand the cown to the next queued behavior, or reset the tail if this
    /// request is the last one.
    ///
    /// # Safety
    ///
    /// The owning behavior must have finished running.
    unsafe fn release(&self) {
        if self.next.load(SeqCst).is_null() {
            // Possibly the last request: try to swing the tail back to null.
            if self
                .target
                .tail()
                .compare_exchange(
                    self as *const Self as *mut Self,
                    ptr::null_mut(),
                    SeqCst,
                    Relaxed,
                )
                .is_ok()
            {
                return;
            }
            // A successor is mid-enqueue; wait for it to link itself.
            let backoff = Backoff::new();
            while self.next.load(SeqCst).is_null() {
                backoff.snooze();
            }
        }
        unsafe { Behavior::resolve_one(self.next.load(SeqCst)) };
    }
}

impl Ord for Request {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        // Thin-pointer identity of the cown; the global enqueue order.
        let this = Arc::as_ptr(&self.target) as *const ();
        let that = Arc::as_ptr(&other.target) as *const ();
        this.cmp(&that)
    }
}

impl PartialOrd for Request {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Request {
    fn eq(&self, other: &Self) -> bool {
        matches!(self.cmp(other), cmp::Ordering::Equal)
    }
}

impl Eq for Request {}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("next", &self.next)
            .field("scheduled", &self.scheduled)
            .finish()
    }
}

type Thunk = Box<dyn FnOnce() + Send>;

/// The captured body of a `when!` block plus its cown requests.
struct Behavior {
    thunk: Thunk,
    /// Requests not yet at the front of their queue, plus one for the
    /// scheduling itself. The behavior runs when this reaches zero.
    pending: AtomicUsize,
    requests: Vec<Request>,
}

impl Behavior {
    fn new<C, F>(cowns: C, body: F) -> Behavior
    where
        C: CownPtrs + Send + 'static,
        F: for<'l> FnOnce(C::CownRefs<'l>) + Send + 'static,
    {
        let mut requests = cowns.requests();
        // Deadlock freedom: all behaviors enqueue in the same cown order.
        requests.sort();
        Behavior {
            pending: AtomicUsize::new(requests.len() + 1),
            thunk: Box::new(move || {
                // SAFETY: the thunk only runs once all requests resolved,
                // which grants exclusive access to every captured cown.
                body(unsafe { cowns.get_mut() })
            }),
            requests,
        }
    }

    /// Leak the behavior and enqueue all its requests with two-phase
    /// locking; the final `resolve_one` drops the scheduling's own hold.
    fn schedule(self) {
        let this = Box::into_raw(Box::new(self));
        // SAFETY: `this` is leaked, each request enqueued exactly once, and
        // the phases are run in order; ownership passes to the queues.
        unsafe {
            for request in &(*this).requests {
                request.start_enqueue(this);
            }
            for request in &(*this).requests {
                request.finish_enqueue();
            }
            Behavior::resolve_one(this);
        }
    }

    /// One of `this`'s requests reached the front of its queue. The last
    /// resolution takes ownership back and runs the thunk on the pool.
    ///
    /// # Safety
    ///
    /// `this` must have come from `schedule`'s leak and still be live.
    unsafe fn resolve_one(this: *const Self) {
        if unsafe { &*this }.pending.fetch_sub(1, SeqCst) != 1 {
            return;
        }
        // Last one out: no other thread sees `this` any more.
        let behavior = unsafe { Box::from_raw(this.cast_mut()) };
        spawn(move || {
            (behavior.thunk)();
            for request in &behavior.requests {
                // SAFETY: the thunk has finished; each cown moves on.
                unsafe { request.release() };
            }
        });
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field("pending", &self.pending)
            .field("requests", &self.requests)
            .finish_non_exhaustive()
    }
}

/// Object-safe face of a cown, so one behavior can hold requests for cowns
/// of different value types.
///
/// # Safety
///
/// `tail` must return the tail pointer of the cown's request queue.
unsafe trait CownBase: Send {
    fn tail(&self) -> &AtomicPtr<Request>;
}

/// The shared state behind [`CownPtr`] handles.
#[derive(Debug)]
struct Cown<T: Send> {
    /// MCS queue tail: the most recently enqueued request.
    tail: AtomicPtr<Request>,
    /// Only accessible from inside a scheduled behavior.
    value: UnsafeCell<T>,
}

// SAFETY: `tail` is indeed the queue tail.
unsafe impl<T: Send> CownBase for Cown<T> {
    fn tail(&self) -> &AtomicPtr<Request> {
        &self.tail
    }
}

/// Shared handle to a cown. Clone it to capture the cown in several
/// behaviors; the value itself is only reachable inside `when!` bodies.
#[derive(Debug)]
pub struct CownPtr<T: Send> {
    inner: Arc<Cown<T>>,
}

// SAFETY: no `&T` escapes a behavior, so `Send` on T suffices.
unsafe impl<T: Send> Send for CownPtr<T> {}

impl<T: Send> Clone for CownPtr<T> {
    fn clone(&self) -> Self {
        CownPtr {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send> CownPtr<T> {
    /// Wrap a value in a fresh cown.
    pub fn new(value: T) -> CownPtr<T> {
        CownPtr {
            inner: Arc::new(Cown {
                tail: AtomicPtr::new(ptr::null_mut()),
                value: UnsafeCell::new(value),
            }),
        }
    }
}

/// A collection of cown handles, as captured by `when!`.
///
/// # Safety
///
/// `requests` must return one request per cown in the collection.
pub unsafe trait CownPtrs {
    /// Mutable references to the cown values, handed to the thunk.
    type CownRefs<'l>
    where
        Self: 'l;

    /// Requests for every cown in the collection.
    fn requests(&self) -> Vec<Request>;

    /// Mutable access to the values.
    ///
    /// # Safety
    ///
    /// Callable only once every request has reached the front of its queue.
    unsafe fn get_mut<'l>(self) -> Self::CownRefs<'l>;
}

unsafe impl CownPtrs for () {
    type CownRefs<'l>
        = ()
    where
        Self: 'l;

    fn requests(&self) -> Vec<Request> {
        Vec::new()
    }

    unsafe fn get_mut<'l>(self) -> Self::CownRefs<'l> {}
}

unsafe impl<T: Send + 'static, Rest: CownPtrs> CownPtrs for (CownPtr<T>, Rest) {
    type CownRefs<'l>
        = (&'l mut T, Rest::CownRefs<'l>)
    where
        Self: 'l;

    fn requests(&self) -> Vec<Request> {
        let mut requests = self.1.requests();
        let target: Arc<dyn CownBase> = Arc::clone(&self.0.inner) as Arc<dyn CownBase>;
        requests.push(Request::new(target));
        requests
    }

    unsafe fn get_mut<'l>(self) -> Self::CownRefs<'l> {
        // SAFETY: forwarded caller contract.
        unsafe { (&mut *self.0.inner.value.get(), self.1.get_mut()) }
    }
}

unsafe impl<T: Send + 'static> CownPtrs for Vec<CownPtr<T>> {
    type CownRefs<'l>
        = Vec<&'l mut T>
    where
        Self: 'l;

    fn requests(&self) -> Vec<Request> {
        self.iter()
            .map(|cown| Request::new(Arc::clone(&cown.inner) as Arc<dyn CownBase>))
            .collect()
    }

    unsafe fn get_mut<'l>(self) -> Self::CownRefs<'l> {
        self.iter()
            .map(|cown| unsafe { &mut *cown.inner.value.get() })
            .collect()
    }
}

/// Schedule `body` to run with exclusive access to `cowns`. The `when!`
/// macro is the ergonomic front end.
pub fn run_when<C, F>(cowns: C, body: F)
where
    C: CownPtrs + Send + 'static,
    F: for<'l> FnOnce(C::CownRefs<'l>) + Send + 'static,
{
    Behavior::new(cowns, body).schedule();
}

/// Cons-list tuples, after <https://docs.rs/tuple_list>.
#[macro_export]
macro_rules! tuple_list {
    () => ( () );

    ($i:ident)  => ( ($i, ()) );
    ($i:ident,) => ( ($i, ()) );
    ($i:ident, $($e:ident),*)  => ( ($i, $crate::tuple_list!($($e),*)) );
    ($i:ident, $($e:ident),*,) => ( ($i, $crate::tuple_list!($($e),*)) );

    ($i:expr)  => ( ($i, ()) );
    ($i:expr,) => ( ($i, ()) );
    ($i:expr, $($e:expr),*)  => ( ($i, $crate::tuple_list!($($e),*)) );
    ($i:expr, $($e:expr),*,) => ( ($i, $crate::tuple_list!($($e),*)) );
}

/// Run a block with exclusive access to a set of cowns:
/// `when!(c1, c2; g1, g2; { *g1 += *g2; })`.
#[macro_export]
macro_rules! when {
    ( $( $cs:ident ),* ; $( $gs:ident ),* ; $body:expr ) => {{
        $crate::cown::run_when(
            $crate::tuple_list!($($cs.clone()),*),
            move |$crate::tuple_list!($($gs),*)| $body,
        );
    }};
}

#[cfg(test)]
#[path = "cown_tests.rs"]
mod tests;
