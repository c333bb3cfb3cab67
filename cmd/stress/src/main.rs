//! Throughput stress test: keeps a fixed number of tasks in flight,
//! re-submitting as each completes, until a total count is reached.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use workq::Loop;

fn main() {
    let total_calls: usize = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(100_000);
    let in_flight: usize = std::env::args()
        .nth(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(1_000);
    let sleep_us: u64 = std::env::args()
        .nth(3)
        .and_then(|s| s.parse().ok())
        .unwrap_or(100);

    println!("=== workq stress test ===\n");
    println!("total calls:  {total_calls}");
    println!("in flight:    {in_flight}");
    println!("sleep per task: {sleep_us}us\n");

    let l = Loop::new();
    println!("pool workers: {}", l.worker_count());

    let initiated = Arc::new(AtomicUsize::new(0));
    let completed = Arc::new(AtomicUsize::new(0));

    let start = Instant::now();

    fn submit_one(l: &Arc<Loop>, initiated: &Arc<AtomicUsize>, completed: &Arc<AtomicUsize>, total: usize, sleep_us: u64) {
        initiated.fetch_add(1, Ordering::SeqCst);
        let l2 = Arc::clone(l);
        let initiated2 = Arc::clone(initiated);
        let completed2 = Arc::clone(completed);
        l.submit(
            move || {
                std::thread::sleep(Duration::from_micros(sleep_us));
            },
            move |_status| {
                completed2.fetch_add(1, Ordering::SeqCst);
                if initiated2.load(Ordering::SeqCst) < total {
                    submit_one(&l2, &initiated2, &completed2, total, sleep_us);
                }
            },
        );
    }

    for _ in 0..in_flight.min(total_calls) {
        submit_one(&l, &initiated, &completed, total_calls, sleep_us);
    }

    let deadline = Instant::now() + Duration::from_secs(120);
    while completed.load(Ordering::SeqCst) < total_calls && Instant::now() < deadline {
        l.wait_and_drain();
    }

    let elapsed = start.elapsed();
    let done = completed.load(Ordering::SeqCst);
    println!("\n=== results ===");
    println!("completed:  {done}/{total_calls}");
    println!("elapsed:    {elapsed:?}");
    println!(
        "throughput: {:.0} req/s",
        done as f64 / elapsed.as_secs_f64()
    );
}
