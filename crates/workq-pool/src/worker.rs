//! A single worker's queue, mutex, and condition variable.

use crate::queue::Queue;
use std::sync::{Condvar, Mutex};

/// One worker's submission queue plus the synchronization primitives
/// `post`/`cancel`/the worker loop all serialize through.
///
/// The mutex guards `queue` only; it is never held while running user code
/// or while pushing onto the completion queue.
pub(crate) struct Worker {
    pub(crate) queue: Mutex<Queue>,
    pub(crate) cond: Condvar,
}

impl Worker {
    pub(crate) fn new() -> Self {
        Worker {
            queue: Mutex::new(Queue::new()),
            cond: Condvar::new(),
        }
    }
}
