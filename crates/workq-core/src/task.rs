//! The submitted unit of work and its intrusive queue link.

use crate::status::Status;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

/// Sentinel meaning "not currently assigned to any worker".
pub const NO_WORKER: usize = usize::MAX;

/// Where a task currently sits relative to its worker's queue. Tracked
/// explicitly rather than inferred from the link pointers: a plain (non
/// sentinel-headed) doubly-linked list can't otherwise tell "this is the
/// only node in the queue" apart from "this node is in no queue at all",
/// which is exactly the distinction `cancel` needs to get right.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Not linked into any queue; no worker claims it.
    Idle = 0,
    /// Linked into a worker's queue, not yet picked up.
    Queued = 1,
    /// Dequeued and currently running (or about to run) on a worker.
    /// Equivalent to libuv's self-loop marker.
    Executing = 2,
}

impl LinkState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => LinkState::Idle,
            1 => LinkState::Queued,
            _ => LinkState::Executing,
        }
    }
}

/// Intrusive doubly-linked membership in exactly one worker queue at a
/// time. Manipulated only while holding the owning worker's mutex.
pub struct Link {
    pub prev: *mut Work,
    pub next: *mut Work,
}

impl Link {
    fn unlinked() -> Self {
        Link {
            prev: std::ptr::null_mut(),
            next: std::ptr::null_mut(),
        }
    }
}

/// The loop-side half of completion delivery: push a finished task onto the
/// loop's completion queue and wake it up. Implemented by the façade's
/// `Loop` type; kept as a trait object here so `Work` doesn't need a type
/// parameter back to its owning loop.
pub trait LoopSink: Send + Sync {
    /// Deliver `status` for `work` through the loop's completion path.
    fn complete(&self, work: Arc<Work>, status: Status);
}

/// A submitted unit of work: a closure to run on a worker, a closure to
/// invoke back on the loop thread with the outcome, and the bookkeeping
/// needed to submit, steal, and cancel it safely.
pub struct Work {
    work_fn: UnsafeCell<Option<Box<dyn FnOnce() + Send>>>,
    done_fn: UnsafeCell<Option<Box<dyn FnOnce(Status) + Send>>>,
    sink: Arc<dyn LoopSink>,
    /// Index of the worker queue this task is linked into or executing on.
    /// Meaningful only when `state != Idle`.
    worker_idx: AtomicUsize,
    state: AtomicU8,
    link: UnsafeCell<Link>,
}

// `work_fn`/`done_fn`/`link` are touched only by whichever thread currently
// holds the owning worker's mutex (or, once dequeued, only by the worker
// executing it, until it hands the `Work` to the completion sink). Both
// closures are themselves `Send`.
unsafe impl Sync for Work {}

impl Work {
    /// Build a new task.
    pub fn new(
        work_fn: Box<dyn FnOnce() + Send>,
        done_fn: Box<dyn FnOnce(Status) + Send>,
        sink: Arc<dyn LoopSink>,
    ) -> Arc<Work> {
        Arc::new(Work {
            work_fn: UnsafeCell::new(Some(work_fn)),
            done_fn: UnsafeCell::new(Some(done_fn)),
            sink,
            worker_idx: AtomicUsize::new(NO_WORKER),
            state: AtomicU8::new(LinkState::Idle as u8),
            link: UnsafeCell::new(Link::unlinked()),
        })
    }

    /// Run the work closure. Must be called at most once, by the worker
    /// thread that dequeued this task.
    pub fn run(&self) {
        if let Some(f) = unsafe { (*self.work_fn.get()).take() } {
            f();
        }
    }

    /// Replace the work closure with nothing, marking the task cancelled
    /// before it ever ran. Safe to call only while holding the worker
    /// mutex that owns this task's queue slot.
    pub fn mark_cancelled(&self) {
        unsafe { (*self.work_fn.get()).take() };
    }

    /// True if `run`/`mark_cancelled` has already consumed the work
    /// closure (i.e. the task has executed or been cancelled).
    pub fn is_spent(&self) -> bool {
        unsafe { (*self.work_fn.get()).is_none() }
    }

    /// Invoke the completion callback with `status`. Must be called at
    /// most once, on the loop thread.
    pub fn finish(&self, status: Status) {
        if let Some(f) = unsafe { (*self.done_fn.get()).take() } {
            f(status);
        }
    }

    pub fn worker_index(&self) -> usize {
        self.worker_idx.load(Ordering::Acquire)
    }

    pub fn set_worker_index(&self, idx: usize) {
        self.worker_idx.store(idx, Ordering::Release);
    }

    pub fn link_state(&self) -> LinkState {
        LinkState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn set_link_state(&self, state: LinkState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Raw access to the intrusive queue link. Callers must hold the
    /// owning worker's mutex before dereferencing.
    pub fn link_ptr(&self) -> *mut Link {
        self.link.get()
    }

    pub fn sink(&self) -> &Arc<dyn LoopSink> {
        &self.sink
    }
}
