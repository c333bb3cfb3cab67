//! Platform-agnostic pieces shared by the worker pool and its façade.
//!
//! This crate owns nothing that spawns a thread. It defines:
//!
//! - [`mpsc`] — the lock-free completion queue workers push into and a loop
//!   thread drains.
//! - [`task`] — the `Work` record and its intrusive links.
//! - [`wakeup`] — the `AsyncWakeup` trait a host loop implements to be told
//!   completions are ready.
//! - [`status`], [`error`] — the result/error vocabulary shared end to end.
//! - [`env`], [`log`] — ambient configuration and diagnostics, used the same
//!   way throughout the workspace.

pub mod constants;
pub mod env;
pub mod error;
#[macro_use]
pub mod log;
pub mod mpsc;
pub mod status;
pub mod task;
pub mod wakeup;

pub use error::{Result, WorkError};
pub use status::Status;
pub use task::{LinkState, Work};
pub use wakeup::AsyncWakeup;
