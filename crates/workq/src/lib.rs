//! Submit/cancel/drain façade wiring [`workq_core`]'s task record and
//! completion queue to [`workq_pool`]'s worker pool.
//!
//! ```no_run
//! use workq::Loop;
//! use workq_core::Status;
//!
//! let l = Loop::new();
//! l.submit(
//!     || { /* runs on a worker thread */ },
//!     |status: Status| { /* runs on the loop thread via drain() */ },
//! );
//! l.wait_and_drain();
//! ```

mod loop_handle;
mod wakeups;

pub use loop_handle::Loop;
pub use wakeups::CondvarWakeup;
#[cfg(unix)]
pub use wakeups::EventFdWakeup;

pub use workq_core::{error, status, AsyncWakeup, Result, Status, Work, WorkError};
pub use workq_pool::{global_pool, Pool, PoolConfig};
