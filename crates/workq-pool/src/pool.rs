//! The fixed-size worker pool: dispatch, stealing, and teardown.

use crate::worker::Worker;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::{self, JoinHandle};
use workq_core::constants::{DEFAULT_WORKERS, ENV_THREADPOOL_SIZE, MAX_WORKERS, POST_SPIN_FACTOR};
use workq_core::env::env_get;
use workq_core::task::{LinkState, NO_WORKER};
use workq_core::{log, Status, Work};

/// Resolved worker-pool configuration, separated from the raw environment
/// read so tests can build a `Pool` without touching process environment.
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub worker_count: usize,
    pub post_spin_factor: usize,
}

impl PoolConfig {
    /// Read `UV_THREADPOOL_SIZE`: missing or `<= 0` defaults to
    /// [`DEFAULT_WORKERS`]; values above [`MAX_WORKERS`] are clamped.
    pub fn from_env() -> Self {
        let raw: i64 = env_get(ENV_THREADPOOL_SIZE, 0);
        let worker_count = if raw <= 0 {
            DEFAULT_WORKERS
        } else {
            (raw as usize).min(MAX_WORKERS)
        };
        PoolConfig {
            worker_count,
            post_spin_factor: POST_SPIN_FACTOR,
        }
    }

    pub fn fixed(worker_count: usize) -> Self {
        PoolConfig {
            worker_count: worker_count.clamp(1, MAX_WORKERS),
            post_spin_factor: POST_SPIN_FACTOR,
        }
    }
}

/// A fixed-size worker pool. Each worker owns a mutex-protected intrusive
/// FIFO; `post` optimistically tries several workers before blocking on a
/// fixed fallback, and the worker loop steals from peers before waiting on
/// its own condition variable.
pub struct Pool {
    workers: Box<[Worker]>,
    post_n: AtomicUsize,
    shutting_down: AtomicBool,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Pool {
    /// Build and start a pool with `config.worker_count` threads.
    pub fn new(config: PoolConfig) -> Arc<Pool> {
        let n = config.worker_count.clamp(1, MAX_WORKERS);
        let mut workers = Vec::with_capacity(n);
        for _ in 0..n {
            workers.push(Worker::new());
        }

        let pool = Arc::new(Pool {
            workers: workers.into_boxed_slice(),
            post_n: AtomicUsize::new(0),
            shutting_down: AtomicBool::new(false),
            handles: Mutex::new(Vec::with_capacity(n)),
        });

        let mut handles = Vec::with_capacity(n);
        for i in 0..n {
            let pool = Arc::clone(&pool);
            let handle = thread::Builder::new()
                .name(format!("workq-worker-{}", i))
                .spawn(move || pool.worker_loop(i))
                .expect("failed to spawn workq worker thread");
            handles.push(handle);
        }
        *pool.handles.lock().unwrap() = handles;
        pool
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Submit `work` for execution. Chooses a worker by optimistic
    /// try-lock scan across `N * post_spin_factor` slots starting at a
    /// rotating cursor, falling back to a blocking lock on a single fixed
    /// worker if every probe is contended.
    pub fn post(&self, work: Arc<Work>) {
        let total = self.workers.len();
        let n = self.post_n.fetch_add(1, Ordering::Relaxed);
        let spins = total.saturating_mul(POST_SPIN_FACTOR);

        let mut chosen = None;
        for i in 0..spins {
            let idx = (n + i) % total;
            if let Ok(guard) = self.workers[idx].queue.try_lock() {
                chosen = Some((idx, guard));
                break;
            }
        }
        let (idx, mut guard) = match chosen {
            Some(x) => x,
            None => {
                let idx = n % total;
                (idx, self.workers[idx].queue.lock().unwrap())
            }
        };

        let ptr = Arc::into_raw(work) as *mut Work;
        unsafe {
            (*ptr).set_worker_index(idx);
            (*ptr).set_link_state(LinkState::Queued);
            guard.push_tail(ptr);
        }
        self.workers[idx].cond.notify_one();
    }

    /// Cancel a previously submitted task.
    ///
    /// Returns `Ok` if the task was unlinked before a worker claimed it (its
    /// `done` callback still fires, with `Status::Canceled`, through the
    /// normal completion path) or if it had already finished. Returns
    /// `Busy` if a worker already owns it.
    pub fn cancel(&self, work: &Arc<Work>) -> Status {
        loop {
            let idx = work.worker_index();
            if idx == NO_WORKER {
                return Status::Ok;
            }
            let mut guard = self.workers[idx].queue.lock().unwrap();
            if work.worker_index() != idx {
                // Raced with the worker finishing; re-read with the new idx.
                continue;
            }
            return match work.link_state() {
                LinkState::Executing => Status::Busy,
                LinkState::Idle => Status::Ok,
                LinkState::Queued => {
                    let ptr = Arc::as_ptr(work) as *mut Work;
                    unsafe { guard.remove(ptr) };
                    drop(guard);
                    // Reclaim the strong reference `post` leaked into the
                    // queue via `Arc::into_raw`.
                    let reclaimed: Arc<Work> = unsafe { Arc::from_raw(ptr) };
                    reclaimed.mark_cancelled();
                    reclaimed.set_link_state(LinkState::Idle);
                    reclaimed.set_worker_index(NO_WORKER);
                    let sink = Arc::clone(reclaimed.sink());
                    sink.complete(reclaimed, Status::Canceled);
                    Status::Ok
                }
            };
        }
    }

    /// Post a shutdown request and join every worker thread. Draining of
    /// already-queued work still happens; workers only exit once their own
    /// queue is empty and shutdown has been requested.
    pub fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        for w in self.workers.iter() {
            let _guard = w.queue.lock().unwrap();
            w.cond.notify_all();
        }
        let handles = std::mem::take(&mut *self.handles.lock().unwrap());
        for h in handles {
            if h.join().is_err() {
                // A worker thread panicked; nothing more we can safely do.
                werror_join_failed();
            }
        }
    }

    fn worker_loop(self: Arc<Self>, me: usize) {
        log::set_worker_id(me);
        let total = self.workers.len();

        'outer: loop {
            let mut stolen = None;
            for i in 0..total {
                let idx = (i + me) % total;
                if let Ok(guard) = self.workers[idx].queue.try_lock() {
                    if guard.is_empty() {
                        continue;
                    }
                    stolen = Some((idx, guard));
                    break;
                }
            }

            let mut guard = match stolen {
                Some((_, guard)) => guard,
                None => {
                    let mut guard = self.workers[me].queue.lock().unwrap();
                    loop {
                        if !guard.is_empty() {
                            break;
                        }
                        if self.shutting_down.load(Ordering::Acquire) {
                            break 'outer;
                        }
                        guard = self.workers[me].cond.wait(guard).unwrap();
                    }
                    guard
                }
            };

            let head = guard.head();
            debug_assert!(!head.is_null());
            unsafe { guard.remove(head) };
            // Mark executing while still holding the worker mutex, so a
            // concurrent `cancel` either sees `Queued` (and the node still
            // linked) or `Executing` — never a dequeued node it believes
            // is still queued.
            unsafe { (*head).set_link_state(LinkState::Executing) };
            drop(guard);

            let work: Arc<Work> = unsafe { Arc::from_raw(head as *const Work) };

            work.run();
            work.set_link_state(LinkState::Idle);
            work.set_worker_index(NO_WORKER);

            let sink = Arc::clone(work.sink());
            sink.complete(work, Status::Ok);
        }

        log::clear_worker_id();
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn werror_join_failed() {
    workq_core::werror!("a worker thread panicked during shutdown");
}

/// Process-wide pool handle, rebuilt on demand and reset by the fork-child
/// handler registered in [`ensure_fork_handler`].
static GLOBAL_POOL: Mutex<Option<Arc<Pool>>> = Mutex::new(None);
static FORK_HANDLER: OnceLock<()> = OnceLock::new();

/// Return the process-wide pool, creating it on first call. Safe to call
/// from any thread.
pub fn global_pool() -> Arc<Pool> {
    ensure_fork_handler();
    let mut guard = GLOBAL_POOL.lock().unwrap();
    if let Some(p) = guard.as_ref() {
        return Arc::clone(p);
    }
    let pool = Pool::new(PoolConfig::from_env());
    *guard = Some(Arc::clone(&pool));
    pool
}

fn ensure_fork_handler() {
    FORK_HANDLER.get_or_init(|| {
        #[cfg(unix)]
        unsafe {
            libc::pthread_atfork(None, None, Some(reset_global_pool_in_child));
        }
    });
}

#[cfg(unix)]
extern "C" fn reset_global_pool_in_child() {
    // Only this thread exists in the freshly forked child; discard the
    // inherited handle so the next `submit` rebuilds the pool from
    // scratch rather than reusing threads that no longer exist here.
    if let Ok(mut guard) = GLOBAL_POOL.try_lock() {
        *guard = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize as AU;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use workq_core::task::LoopSink;

    struct RecordingSink {
        results: StdMutex<Vec<Status>>,
    }
    impl LoopSink for RecordingSink {
        fn complete(&self, work: Arc<Work>, status: Status) {
            self.results.lock().unwrap().push(status);
            work.finish(status);
        }
    }

    #[test]
    fn single_task_runs_and_completes() {
        let pool = Pool::new(PoolConfig::fixed(2));
        let ran = Arc::new(AtomicBool::new(false));
        let sink = Arc::new(RecordingSink {
            results: StdMutex::new(Vec::new()),
        });
        let ran2 = Arc::clone(&ran);
        let done_count = Arc::new(AU::new(0));
        let done_count2 = Arc::clone(&done_count);
        let work = Work::new(
            Box::new(move || ran2.store(true, Ordering::SeqCst)),
            Box::new(move |_s| {
                done_count2.fetch_add(1, Ordering::SeqCst);
            }),
            sink,
        );
        pool.post(work);

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while done_count.load(Ordering::SeqCst) == 0 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(ran.load(Ordering::SeqCst));
        assert_eq!(done_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fairness_across_many_tasks() {
        const N_WORKERS: usize = 4;
        const N_TASKS: usize = 400;
        let pool = Pool::new(PoolConfig::fixed(N_WORKERS));
        let sink = Arc::new(RecordingSink {
            results: StdMutex::new(Vec::new()),
        });
        let remaining = Arc::new(AU::new(N_TASKS));
        for _ in 0..N_TASKS {
            let remaining2 = Arc::clone(&remaining);
            let work = Work::new(
                Box::new(move || {
                    thread::sleep(Duration::from_micros(200));
                }),
                Box::new(move |_s| {
                    remaining2.fetch_sub(1, Ordering::SeqCst);
                }),
                Arc::clone(&sink) as Arc<dyn LoopSink>,
            );
            pool.post(work);
        }

        let deadline = std::time::Instant::now() + Duration::from_secs(10);
        while remaining.load(Ordering::SeqCst) > 0 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(remaining.load(Ordering::SeqCst), 0);
        assert_eq!(sink.results.lock().unwrap().len(), N_TASKS);
    }

    #[test]
    fn cancel_before_run_delivers_canceled() {
        let pool = Pool::new(PoolConfig::fixed(1));
        // Occupy the single worker so the next submission stays queued.
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        let blocker_sink = Arc::new(RecordingSink {
            results: StdMutex::new(Vec::new()),
        });
        let blocker = Work::new(
            Box::new(move || {
                let _ = rx.recv();
            }),
            Box::new(|_| {}),
            blocker_sink,
        );
        pool.post(blocker);
        thread::sleep(Duration::from_millis(50));

        let sink = Arc::new(RecordingSink {
            results: StdMutex::new(Vec::new()),
        });
        let work = Work::new(Box::new(|| {}), Box::new(|_| {}), Arc::clone(&sink) as Arc<dyn LoopSink>);
        pool.post(Arc::clone(&work));

        let status = pool.cancel(&work);
        assert_eq!(status, Status::Ok);

        tx.send(()).unwrap();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(sink.results.lock().unwrap().as_slice(), &[Status::Canceled]);
    }
}
