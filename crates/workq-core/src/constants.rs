//! Tunables fixed by design, not by environment.

/// Hard ceiling on the worker count, matching `UV_THREADPOOL_SIZE`'s clamp.
pub const MAX_WORKERS: usize = 1024;

/// Worker count used when `UV_THREADPOOL_SIZE` is unset or non-positive.
pub const DEFAULT_WORKERS: usize = 4;

/// How many worker slots `post` probes optimistically before falling back
/// to a blocking lock, expressed as a multiple of the worker count.
pub const POST_SPIN_FACTOR: usize = 2;

/// Name of the environment variable controlling worker count.
pub const ENV_THREADPOOL_SIZE: &str = "UV_THREADPOOL_SIZE";
