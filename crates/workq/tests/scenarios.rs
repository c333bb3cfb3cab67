//! Scenario-level integration tests exercising the façade end to end.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use workq::{Loop, Status};

fn run_until<F: Fn() -> bool>(l: &Arc<Loop>, deadline: Instant, done: F) {
    while !done() && Instant::now() < deadline {
        l.wait_and_drain();
    }
}

/// S1 (scaled down from the 100k/1000-in-flight original): a steady stream
/// of short tasks all complete with `Status::Ok`.
#[test]
fn throughput_smoke() {
    const TOTAL: usize = 2_000;
    const IN_FLIGHT: usize = 64;

    let l = Loop::with_worker_count(8);
    let completed = Arc::new(AtomicUsize::new(0));
    let ok_count = Arc::new(AtomicUsize::new(0));
    let submitted = Arc::new(AtomicUsize::new(0));

    let deadline = Instant::now() + Duration::from_secs(20);
    loop {
        while submitted.load(Ordering::SeqCst) < TOTAL
            && submitted.load(Ordering::SeqCst) - completed.load(Ordering::SeqCst) < IN_FLIGHT
        {
            submit_one(&l, &completed, &ok_count);
            submitted.fetch_add(1, Ordering::SeqCst);
        }
        if completed.load(Ordering::SeqCst) == TOTAL {
            break;
        }
        if Instant::now() > deadline {
            break;
        }
        l.wait_and_drain();
    }

    assert_eq!(completed.load(Ordering::SeqCst), TOTAL);
    assert_eq!(ok_count.load(Ordering::SeqCst), TOTAL);
}

fn submit_one(l: &Arc<Loop>, completed: &Arc<AtomicUsize>, ok_count: &Arc<AtomicUsize>) {
    let completed2 = Arc::clone(completed);
    let ok_count2 = Arc::clone(ok_count);
    l.submit(
        || {
            std::thread::sleep(Duration::from_micros(100));
        },
        move |status| {
            if status == Status::Ok {
                ok_count2.fetch_add(1, Ordering::SeqCst);
            }
            completed2.fetch_add(1, Ordering::SeqCst);
        },
    );
}

/// S2: tasks pinned to a single worker complete in submission order.
#[test]
fn single_worker_preserves_order() {
    let l = Loop::with_worker_count(1);
    let order = Arc::new(Mutex::new(Vec::new()));
    for i in 0..20 {
        let order2 = Arc::clone(&order);
        l.submit(move || {}, move |_| order2.lock().unwrap().push(i));
    }
    let deadline = Instant::now() + Duration::from_secs(5);
    run_until(&l, deadline, || order.lock().unwrap().len() == 20);
    assert_eq!(*order.lock().unwrap(), (0..20).collect::<Vec<_>>());
}

/// S3: with several workers and many short tasks, no worker starves —
/// every submitted task completes (a stronger, easier-to-assert property
/// than strict load balancing, which this pool's design doesn't promise).
#[test]
fn multi_worker_all_tasks_complete() {
    const WORKERS: usize = 8;
    const TASKS: usize = 2_000;
    let l = Loop::with_worker_count(WORKERS);
    let completed = Arc::new(AtomicUsize::new(0));
    for _ in 0..TASKS {
        let completed2 = Arc::clone(&completed);
        l.submit(
            || std::thread::sleep(Duration::from_micros(50)),
            move |_| {
                completed2.fetch_add(1, Ordering::SeqCst);
            },
        );
    }
    let deadline = Instant::now() + Duration::from_secs(20);
    run_until(&l, deadline, || completed.load(Ordering::SeqCst) == TASKS);
    assert_eq!(completed.load(Ordering::SeqCst), TASKS);
}

/// S5: a work closure that itself submits must not deadlock.
#[test]
fn submit_from_within_work_completes() {
    let l = Loop::with_worker_count(4);
    let outer = Arc::new(AtomicUsize::new(0));
    let inner = Arc::new(AtomicUsize::new(0));
    let l2 = Arc::clone(&l);
    let outer2 = Arc::clone(&outer);
    let inner2 = Arc::clone(&inner);
    l.submit(
        move || {
            outer2.fetch_add(1, Ordering::SeqCst);
            let inner3 = Arc::clone(&inner2);
            l2.submit(
                move || {
                    inner3.fetch_add(1, Ordering::SeqCst);
                },
                |_| {},
            );
        },
        |_| {},
    );
    let deadline = Instant::now() + Duration::from_secs(5);
    run_until(&l, deadline, || {
        outer.load(Ordering::SeqCst) == 1 && inner.load(Ordering::SeqCst) == 1
    });
    assert_eq!(outer.load(Ordering::SeqCst), 1);
    assert_eq!(inner.load(Ordering::SeqCst), 1);
}

/// Property 4: no worker mutex may be held while user code runs — if it
/// were, the submit-from-work pattern above would deadlock under a single
/// worker. Run it with `with_worker_count(1)` as the stricter variant.
#[test]
fn submit_from_work_single_worker_does_not_deadlock() {
    let l = Loop::with_worker_count(1);
    let inner = Arc::new(AtomicUsize::new(0));
    let l2 = Arc::clone(&l);
    let inner2 = Arc::clone(&inner);
    l.submit(
        move || {
            let inner3 = Arc::clone(&inner2);
            l2.submit(
                move || {
                    inner3.fetch_add(1, Ordering::SeqCst);
                },
                |_| {},
            );
        },
        |_| {},
    );
    let deadline = Instant::now() + Duration::from_secs(5);
    run_until(&l, deadline, || inner.load(Ordering::SeqCst) == 1);
    assert_eq!(inner.load(Ordering::SeqCst), 1);
}
