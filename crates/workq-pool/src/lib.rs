//! Fixed-size worker pool: per-worker intrusive queues, optimistic/pessimistic
//! dispatch, work stealing, and fork-safe process-wide state.
//!
//! [`workq_core`] supplies the task record and completion queue; this crate
//! is the part that owns OS threads.

mod queue;
mod worker;

pub mod pool;

pub use pool::{global_pool, Pool, PoolConfig};
