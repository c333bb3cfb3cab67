//! Error types for the worker pool and its façade.

use core::fmt;

/// Result type for fallible pool/façade operations.
pub type Result<T> = std::result::Result<T, WorkError>;

/// Errors that occur outside the normal `Status` completion path — things
/// that happen before a `Work` exists to report through, or that are fatal
/// enough that no caller-visible completion makes sense.
#[derive(Debug)]
pub enum WorkError {
    /// `submit` was called with no work closure.
    InvalidWorkFn,
    /// `cancel`/`submit` referenced a request kind this façade doesn't route.
    UnknownRequestKind,
    /// Pool initialization failed to create a mutex, condvar, or semaphore.
    InitFailed(&'static str),
    /// Spawning a worker thread failed.
    SpawnFailed(std::io::Error),
    /// Joining a worker thread during teardown failed.
    JoinFailed,
    /// A platform primitive (eventfd, pthread_atfork, ...) returned an error.
    Os(i32),
}

impl fmt::Display for WorkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkError::InvalidWorkFn => write!(f, "submit called without a work function"),
            WorkError::UnknownRequestKind => write!(f, "unknown request kind"),
            WorkError::InitFailed(what) => write!(f, "pool init failed: {}", what),
            WorkError::SpawnFailed(e) => write!(f, "failed to spawn worker thread: {}", e),
            WorkError::JoinFailed => write!(f, "failed to join worker thread"),
            WorkError::Os(code) => write!(f, "platform error: {}", code),
        }
    }
}

impl std::error::Error for WorkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WorkError::SpawnFailed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for WorkError {
    fn from(e: std::io::Error) -> Self {
        WorkError::SpawnFailed(e)
    }
}
