//! `Loop` — the façade a caller submits work through.
//!
//! Owns one completion [`Mpsc`] queue and the wakeup primitives workers
//! signal when they push into it. There is no "the event loop" here: a
//! real host loop is expected to call [`Loop::drain`] from its own async
//! callback; [`Loop::wait_and_drain`] is the trivial polling stand-in the
//! demo binaries use instead.

use crate::wakeups::CondvarWakeup;
use std::sync::Arc;
use workq_core::error::{Result, WorkError};
use workq_core::mpsc::Mpsc;
use workq_core::task::LoopSink;
use workq_core::{AsyncWakeup, Status, Work};
use workq_pool::{global_pool, Pool, PoolConfig};

/// Submission/completion façade for one logical event loop.
///
/// Multiple `Loop`s may share the same process-wide [`Pool`] (the default,
/// via [`Loop::new`]) or each own a dedicated pool (via [`Loop::with_pool`]),
/// which scenario tests use to pin an exact worker count without mutating
/// process environment.
pub struct Loop {
    pool: Arc<Pool>,
    completions: Mpsc<(Arc<Work>, Status)>,
    wakeup: Arc<CondvarWakeup>,
    external: Option<Arc<dyn AsyncWakeup>>,
}

impl Loop {
    /// A loop backed by the process-wide pool (sized from
    /// `UV_THREADPOOL_SIZE`, created lazily on first use by any loop).
    pub fn new() -> Arc<Loop> {
        Self::with_pool(global_pool())
    }

    /// A loop backed by a dedicated pool of exactly `n` workers.
    pub fn with_worker_count(n: usize) -> Arc<Loop> {
        Self::with_pool(Pool::new(PoolConfig::fixed(n)))
    }

    pub fn with_pool(pool: Arc<Pool>) -> Arc<Loop> {
        Arc::new(Loop {
            pool,
            completions: Mpsc::new(),
            wakeup: Arc::new(CondvarWakeup::new()),
            external: None,
        })
    }

    /// Attach an additional wakeup (e.g. an `EventFdWakeup` a real loop
    /// polls) that gets notified alongside the internal one.
    pub fn with_pool_and_external_wakeup(pool: Arc<Pool>, external: Arc<dyn AsyncWakeup>) -> Arc<Loop> {
        Arc::new(Loop {
            pool,
            completions: Mpsc::new(),
            wakeup: Arc::new(CondvarWakeup::new()),
            external: Some(external),
        })
    }

    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    /// Submit a task. `done_fn` runs on whichever thread calls `drain`.
    pub fn submit(
        self: &Arc<Self>,
        work_fn: impl FnOnce() + Send + 'static,
        done_fn: impl FnOnce(Status) + Send + 'static,
    ) -> Arc<Work> {
        self.submit_boxed(Some(Box::new(work_fn)), Box::new(done_fn))
            .expect("work_fn is present")
    }

    /// Raw form of `submit` accepting an already-boxed, possibly-absent
    /// work closure; rejects a missing one with
    /// [`WorkError::InvalidWorkFn`] instead of panicking.
    pub fn submit_boxed(
        self: &Arc<Self>,
        work_fn: Option<Box<dyn FnOnce() + Send>>,
        done_fn: Box<dyn FnOnce(Status) + Send>,
    ) -> Result<Arc<Work>> {
        let work_fn = work_fn.ok_or(WorkError::InvalidWorkFn)?;
        let sink: Arc<dyn LoopSink> = Arc::clone(self) as Arc<dyn LoopSink>;
        let work = Work::new(work_fn, done_fn, sink);
        self.pool.post(Arc::clone(&work));
        Ok(work)
    }

    /// Cancel a task submitted on this (or any) loop sharing the same
    /// pool. See [`Pool::cancel`] for the exact semantics.
    pub fn cancel(&self, work: &Arc<Work>) -> Status {
        self.pool.cancel(work)
    }

    /// Drain every completion currently queued, invoking each `done_fn`.
    /// Returns how many were drained. Safe to call speculatively on a
    /// spurious wakeup (returns 0).
    pub fn drain(&self) -> usize {
        let mut n = 0;
        while let Some((work, status)) = self.completions.pop() {
            work.finish(status);
            n += 1;
        }
        n
    }

    /// Block until at least one completion is signaled, then drain.
    /// Stand-in for a real loop's async-wakeup callback.
    pub fn wait_and_drain(&self) -> usize {
        self.wakeup.wait();
        self.drain()
    }
}

impl LoopSink for Loop {
    fn complete(&self, work: Arc<Work>, status: Status) {
        self.completions.push((work, status));
        let _ = self.wakeup.notify();
        if let Some(ext) = &self.external {
            let _ = ext.notify();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn submit_then_drain_runs_done_once() {
        let l = Loop::with_worker_count(2);
        let ran = Arc::new(AtomicUsize::new(0));
        let ran2 = Arc::clone(&ran);
        l.submit(
            move || {
                ran2.fetch_add(1, Ordering::SeqCst);
            },
            |status| assert_eq!(status, Status::Ok),
        );
        l.wait_and_drain();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn submit_boxed_rejects_missing_work_fn() {
        let l = Loop::with_worker_count(1);
        let err = l.submit_boxed(None, Box::new(|_| {})).unwrap_err();
        assert!(matches!(err, WorkError::InvalidWorkFn));
    }

    #[test]
    fn ordering_within_a_single_worker() {
        let l = Loop::with_worker_count(1);
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        for i in 0..10 {
            let order2 = Arc::clone(&order);
            l.submit(
                move || {},
                move |_s| order2.lock().unwrap().push(i),
            );
        }
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while order.lock().unwrap().len() < 10 && std::time::Instant::now() < deadline {
            l.wait_and_drain();
        }
        assert_eq!(*order.lock().unwrap(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn submit_from_work_does_not_deadlock() {
        let l = Loop::with_worker_count(2);
        let inner_ran = Arc::new(AtomicUsize::new(0));
        let outer_ran = Arc::new(AtomicUsize::new(0));
        let l2 = Arc::clone(&l);
        let inner_ran2 = Arc::clone(&inner_ran);
        let outer_ran2 = Arc::clone(&outer_ran);
        l.submit(
            move || {
                outer_ran2.fetch_add(1, Ordering::SeqCst);
                let inner_ran3 = Arc::clone(&inner_ran2);
                l2.submit(
                    move || {
                        inner_ran3.fetch_add(1, Ordering::SeqCst);
                    },
                    |_| {},
                );
            },
            |_| {},
        );

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while (outer_ran.load(Ordering::SeqCst) == 0 || inner_ran.load(Ordering::SeqCst) == 0)
            && std::time::Instant::now() < deadline
        {
            l.wait_and_drain();
        }
        assert_eq!(outer_ran.load(Ordering::SeqCst), 1);
        assert_eq!(inner_ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancel_already_completed_is_noop_ok() {
        let l = Loop::with_worker_count(1);
        let work = l.submit(|| {}, |_| {});
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while work.worker_index() != workq_core::task::NO_WORKER
            && std::time::Instant::now() < deadline
        {
            l.wait_and_drain();
        }
        assert_eq!(l.cancel(&work), Status::Ok);
    }
}
