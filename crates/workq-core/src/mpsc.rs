//! Lock-free multi-producer single-consumer completion queue.
//!
//! Based on Dmitry Vyukov's non-intrusive node-based MPSC algorithm
//! (<http://www.1024cores.net/home/lock-free-algorithms/queues/non-intrusive-mpsc-node-based-queue>).
//! Any number of worker threads may [`Mpsc::push`]; exactly one consumer
//! (the loop thread) may call [`Mpsc::pop`].
//!
//! Nodes are heap-allocated and owned by the queue between `push` and
//! `pop`; `pop` hands ownership back to the caller as a `Box`.

use std::cell::UnsafeCell;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

struct Node<T> {
    next: AtomicPtr<Node<T>>,
    state: Option<T>,
}

/// A lock-free MPSC queue carrying payloads of type `T`.
///
/// `create` wires in an internal stub node so `tail` is never null; the
/// stub migrates forward as nodes are popped, so the queue never needs to
/// allocate one beyond what callers push.
pub struct Mpsc<T> {
    head: AtomicPtr<Node<T>>,
    // Only ever read/written by the single consumer thread; plain atomics
    // would be overkill, so this is a bare cell guarded by the "single
    // consumer" contract rather than the type system.
    tail: UnsafeCell<*mut Node<T>>,
}

// The consumer side (`tail`) is only ever touched by one thread by
// contract; `head` is synchronized via atomic exchange. Callers must
// uphold "single consumer".
unsafe impl<T: Send> Send for Mpsc<T> {}
unsafe impl<T: Send> Sync for Mpsc<T> {}

impl<T> Mpsc<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        let stub = Box::into_raw(Box::new(Node {
            next: AtomicPtr::new(ptr::null_mut()),
            state: None,
        }));
        Mpsc {
            head: AtomicPtr::new(stub),
            tail: UnsafeCell::new(stub),
        }
    }

    /// Push a value. May be called concurrently from any number of threads.
    pub fn push(&self, value: T) {
        let node = Box::into_raw(Box::new(Node {
            next: AtomicPtr::new(ptr::null_mut()),
            state: Some(value),
        }));
        // Serialization point wrt other producers.
        let prev = self.head.swap(node, Ordering::AcqRel);
        // Serialization point wrt the consumer.
        unsafe { (*prev).next.store(node, Ordering::Release) };
    }

    /// Pop a value, if one is ready. Must only be called from the single
    /// consumer thread.
    ///
    /// Returns `None` both when the queue is genuinely empty and when a
    /// producer is caught between its `swap` and its `next` store; callers
    /// must treat both cases as "try again on the next wakeup".
    ///
    /// # Safety
    /// The caller must guarantee no other thread calls `pop` concurrently.
    pub fn pop(&self) -> Option<T> {
        let tail = unsafe { *self.tail.get() };
        // Serialization point wrt producers.
        let next = unsafe { (*tail).next.load(Ordering::Acquire) };
        if next.is_null() {
            return None;
        }
        let value = unsafe { (*next).state.take() };
        unsafe { *self.tail.get() = next };
        unsafe { drop(Box::from_raw(tail)) };
        value
    }
}

impl<T> Default for Mpsc<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Mpsc<T> {
    fn drop(&mut self) {
        let mut cur = unsafe { *self.tail.get() };
        while !cur.is_null() {
            let next = unsafe { (*cur).next.load(Ordering::Relaxed) };
            unsafe { drop(Box::from_raw(cur)) };
            cur = next;
        }
    }
}
