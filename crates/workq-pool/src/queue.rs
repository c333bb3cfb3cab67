//! The per-worker intrusive FIFO.
//!
//! Plain doubly-linked list of `Work` nodes (no permanent sentinel header —
//! `workq_core::task::LinkState` is what tells an empty queue apart from a
//! task mid-execution, so the list itself doesn't need the usual
//! circular-queue trick to disambiguate "empty"). All operations here
//! assume the caller holds the owning worker's mutex.

use std::ptr;
use workq_core::Work;

pub(crate) struct Queue {
    head: *mut Work,
    tail: *mut Work,
}

impl Queue {
    pub(crate) fn new() -> Self {
        Queue {
            head: ptr::null_mut(),
            tail: ptr::null_mut(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.head.is_null()
    }

    pub(crate) fn head(&self) -> *mut Work {
        self.head
    }

    /// # Safety
    /// `w` must not already be linked into any queue.
    pub(crate) unsafe fn push_tail(&mut self, w: *mut Work) {
        let link = &mut *(*w).link_ptr();
        link.next = ptr::null_mut();
        link.prev = self.tail;
        if self.tail.is_null() {
            self.head = w;
        } else {
            (*(*self.tail).link_ptr()).next = w;
        }
        self.tail = w;
    }

    /// Unlink an arbitrary node (used both to pop the head and to splice
    /// out a cancelled task from the middle of the queue).
    ///
    /// # Safety
    /// `w` must currently be linked into this queue.
    pub(crate) unsafe fn remove(&mut self, w: *mut Work) {
        let (prev, next) = {
            let link = &*(*w).link_ptr();
            (link.prev, link.next)
        };
        if prev.is_null() {
            self.head = next;
        } else {
            (*(*prev).link_ptr()).next = next;
        }
        if next.is_null() {
            self.tail = prev;
        } else {
            (*(*next).link_ptr()).prev = prev;
        }
        let link = &mut *(*w).link_ptr();
        link.prev = ptr::null_mut();
        link.next = ptr::null_mut();
    }
}
