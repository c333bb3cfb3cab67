//! The asynchronous wakeup a host loop provides so workers can tell it
//! completions are waiting.
//!
//! This is the one genuinely external collaborator the pool depends on: a
//! real event loop already owns a cross-thread-safe wakeup primitive
//! (an eventfd, a self-pipe, an IOCP post). The façade ships two usable
//! implementations so the pool is runnable end to end without one, but a
//! host loop is expected to supply its own.

use crate::error::Result;

/// A cross-thread-safe signal that tells a loop thread to drain completions.
///
/// `notify` may be called concurrently from any worker thread and must be
/// safe to call any number of times; a loop that coalesces redundant
/// wakeups (most do) is expected behavior, not a bug to work around.
pub trait AsyncWakeup: Send + Sync {
    fn notify(&self) -> Result<()>;
}
