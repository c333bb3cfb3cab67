//! The result code delivered to `done` callbacks and returned by `cancel`.

/// Outcome of a submitted task, or of a `cancel` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The task ran to completion, or the cancel request found nothing left
    /// to do.
    Ok,
    /// The task was unlinked before a worker picked it up.
    Canceled,
    /// A worker already owns the task; cancellation was refused.
    Busy,
    /// The request referenced an unknown or unsupported kind of work.
    Invalid,
}

impl Status {
    pub fn is_ok(self) -> bool {
        matches!(self, Status::Ok)
    }
}
