//! S4: many producer threads pushing concurrently against a single
//! consumer draining in a tight loop, checked across the crate boundary
//! rather than from inside `mpsc.rs` itself.

use std::sync::Arc;
use std::thread;
use workq_core::mpsc::Mpsc;

#[test]
fn concurrent_producers_single_consumer_no_loss() {
    const PRODUCERS: usize = 8;
    const PER_PRODUCER: usize = 5_000;

    let q: Arc<Mpsc<usize>> = Arc::new(Mpsc::new());
    let mut handles = Vec::new();
    for p in 0..PRODUCERS {
        let q = Arc::clone(&q);
        handles.push(thread::spawn(move || {
            for i in 0..PER_PRODUCER {
                q.push(p * PER_PRODUCER + i);
            }
        }));
    }

    let mut seen = 0usize;
    let mut pending = handles;
    while !pending.is_empty() || seen < PRODUCERS * PER_PRODUCER {
        while q.pop().is_some() {
            seen += 1;
        }
        pending.retain(|h| !h.is_finished());
        if pending.is_empty() {
            while q.pop().is_some() {
                seen += 1;
            }
            break;
        }
    }

    assert_eq!(seen, PRODUCERS * PER_PRODUCER);
}
