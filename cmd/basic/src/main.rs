//! Submits a handful of tasks to a loop backed by the default pool, cancels
//! one before it can run, and prints what each task reported back.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use workq::{Loop, Status};

fn main() {
    println!("=== workq basic example ===\n");

    let l = Loop::with_worker_count(4);
    println!("pool workers: {}", l.worker_count());

    let completed = Arc::new(AtomicUsize::new(0));
    let total = 4usize;

    for i in 0..3 {
        let completed = Arc::clone(&completed);
        l.submit(
            move || {
                println!("[task {i}] running");
            },
            move |status| {
                println!("[task {i}] done: {status:?}");
                completed.fetch_add(1, Ordering::SeqCst);
            },
        );
    }

    let blocked = l.submit(
        move || {
            println!("[task 3] running (should not print — cancelled first)");
        },
        {
            let completed = Arc::clone(&completed);
            move |status| {
                println!("[task 3] done: {status:?}");
                completed.fetch_add(1, Ordering::SeqCst);
            }
        },
    );
    println!("cancel(task 3) -> {:?}", l.cancel(&blocked));

    let start = Instant::now();
    let timeout = Duration::from_secs(5);
    while completed.load(Ordering::SeqCst) < total {
        if start.elapsed() > timeout {
            println!("WARNING: timed out waiting for completions");
            break;
        }
        l.wait_and_drain();
    }

    println!(
        "\n{}/{} tasks completed",
        completed.load(Ordering::SeqCst),
        total
    );
    println!("=== done ===");
}
