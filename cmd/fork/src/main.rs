//! Demonstrates that the process-wide pool survives a `fork()`: the parent
//! warms it up, forks, and both processes independently submit and drain a
//! task on `global_pool()` — the child's copy is rebuilt from scratch by
//! the `pthread_atfork` child handler rather than reused.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use workq::{global_pool, Loop, Status};

fn run_one(label: &str) -> bool {
    let l = Loop::with_pool(global_pool());
    let done = Arc::new(AtomicUsize::new(0));
    let done2 = Arc::clone(&done);
    let pid = std::process::id();
    l.submit(
        move || {
            println!("[{label} pid={pid}] task running on a pool thread");
        },
        move |status| {
            println!("[{label} pid={pid}] task done: {status:?}");
            if status == Status::Ok {
                done2.fetch_add(1, Ordering::SeqCst);
            }
        },
    );
    let deadline = Instant::now() + Duration::from_secs(5);
    while done.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
        l.wait_and_drain();
    }
    done.load(Ordering::SeqCst) == 1
}

fn main() {
    println!("=== workq fork example ===\n");
    println!("parent pid={}", std::process::id());
    println!("warming up global pool ({} workers)", global_pool().worker_count());
    assert!(run_one("parent-before-fork"));

    let pid = unsafe { libc::fork() };
    if pid < 0 {
        eprintln!("fork() failed");
        std::process::exit(1);
    }

    if pid == 0 {
        let ok = run_one("child");
        std::process::exit(if ok { 0 } else { 1 });
    }

    let ok_after = run_one("parent-after-fork");

    let mut status: libc::c_int = 0;
    let waited = unsafe { libc::waitpid(pid, &mut status, 0) };
    let child_ok = waited == pid && libc::WIFEXITED(status) && libc::WEXITSTATUS(status) == 0;

    println!("\n=== results ===");
    println!("child completed its own task:  {child_ok}");
    println!("parent still works after fork: {ok_after}");

    if !child_ok || !ok_after {
        std::process::exit(1);
    }
}
