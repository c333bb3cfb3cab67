//! Default [`AsyncWakeup`] implementations.
//!
//! A real host loop supplies its own wakeup primitive; these exist so the
//! façade is runnable and testable without one.

use std::sync::{Condvar, Mutex};
use workq_core::error::{Result, WorkError};
use workq_core::AsyncWakeup;

/// Portable default: a `Condvar` a loop can block on between drains.
pub struct CondvarWakeup {
    pending: Mutex<bool>,
    cond: Condvar,
}

impl CondvarWakeup {
    pub fn new() -> Self {
        CondvarWakeup {
            pending: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    /// Block until `notify` has been called at least once since the last
    /// `wait`, then clear the pending flag. Used by the demo binaries'
    /// trivial polling loop in place of a real event loop.
    pub fn wait(&self) {
        let mut pending = self.pending.lock().unwrap();
        while !*pending {
            pending = self.cond.wait(pending).unwrap();
        }
        *pending = false;
    }

    pub fn wait_timeout(&self, timeout: std::time::Duration) -> bool {
        let mut pending = self.pending.lock().unwrap();
        if !*pending {
            let (guard, result) = self.cond.wait_timeout(pending, timeout).unwrap();
            pending = guard;
            if result.timed_out() && !*pending {
                return false;
            }
        }
        *pending = false;
        true
    }
}

impl Default for CondvarWakeup {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncWakeup for CondvarWakeup {
    fn notify(&self) -> Result<()> {
        let mut pending = self.pending.lock().unwrap();
        *pending = true;
        self.cond.notify_one();
        Ok(())
    }
}

/// Unix default: an eventfd, coalescing repeated notifications the same
/// way the kernel counter does.
#[cfg(unix)]
pub struct EventFdWakeup {
    fd: std::os::unix::io::RawFd,
}

#[cfg(unix)]
impl EventFdWakeup {
    pub fn create() -> Result<Self> {
        let fd = unsafe { libc::eventfd(0, libc::EFD_NONBLOCK | libc::EFD_CLOEXEC) };
        if fd < 0 {
            return Err(WorkError::Os(unsafe { *libc::__errno_location() }));
        }
        Ok(EventFdWakeup { fd })
    }

    pub fn fd(&self) -> std::os::unix::io::RawFd {
        self.fd
    }

    /// Drain the eventfd counter; returns `true` if it had been signaled.
    pub fn consume(&self) -> bool {
        let mut val: u64 = 0;
        let ret = unsafe {
            libc::read(
                self.fd,
                &mut val as *mut u64 as *mut libc::c_void,
                std::mem::size_of::<u64>(),
            )
        };
        ret > 0
    }
}

#[cfg(unix)]
impl AsyncWakeup for EventFdWakeup {
    fn notify(&self) -> Result<()> {
        let val: u64 = 1;
        let ret = unsafe {
            libc::write(
                self.fd,
                &val as *const u64 as *const libc::c_void,
                std::mem::size_of::<u64>(),
            )
        };
        if ret < 0 {
            let errno = unsafe { *libc::__errno_location() };
            if errno == libc::EAGAIN {
                return Ok(());
            }
            return Err(WorkError::Os(errno));
        }
        Ok(())
    }
}

#[cfg(unix)]
impl Drop for EventFdWakeup {
    fn drop(&mut self) {
        unsafe { libc::close(self.fd) };
    }
}
