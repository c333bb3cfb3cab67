//! Reproduces the classic threadpool throughput benchmark: keep
//! `CONCURRENT_CALLS` tasks in flight, each sleeping `SLEEP_US`
//! microseconds, re-submitting on completion until `TOTAL_CALLS` have run,
//! and report requests/sec.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use workq::Loop;

const CONCURRENT_CALLS: usize = 1_000;
const TOTAL_CALLS: usize = 100_000;
const SLEEP_US: u64 = 100;

fn task_initiate(
    l: &Arc<Loop>,
    initiated: &Arc<AtomicUsize>,
    completed: &Arc<AtomicUsize>,
) {
    initiated.fetch_add(1, Ordering::SeqCst);
    let l2 = Arc::clone(l);
    let initiated2 = Arc::clone(initiated);
    let completed2 = Arc::clone(completed);
    l.submit(
        || std::thread::sleep(Duration::from_micros(SLEEP_US)),
        move |_status| {
            completed2.fetch_add(1, Ordering::SeqCst);
            if initiated2.load(Ordering::SeqCst) < TOTAL_CALLS {
                task_initiate(&l2, &initiated2, &completed2);
            }
        },
    );
}

fn main() {
    let l = Loop::new();
    let initiated = Arc::new(AtomicUsize::new(0));
    let completed = Arc::new(AtomicUsize::new(0));

    let start = Instant::now();
    for _ in 0..CONCURRENT_CALLS {
        task_initiate(&l, &initiated, &completed);
    }

    let deadline = Instant::now() + Duration::from_secs(120);
    while completed.load(Ordering::SeqCst) < TOTAL_CALLS && Instant::now() < deadline {
        l.wait_and_drain();
    }
    let elapsed = start.elapsed();

    assert_eq!(initiated.load(Ordering::SeqCst), TOTAL_CALLS);
    assert_eq!(completed.load(Ordering::SeqCst), TOTAL_CALLS);

    eprintln!(
        "threadpool: {:.0} req/s",
        completed.load(Ordering::SeqCst) as f64 / elapsed.as_secs_f64() * 1.0
    );
}
