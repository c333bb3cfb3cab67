//! Leveled diagnostic logging for the pool and façade.
//!
//! Plain `eprintln!`-style output is too noisy to tell apart across worker
//! threads, so every line carries the worker index of the thread that wrote
//! it (loop-thread lines carry none).
//!
//! # Environment variables
//!
//! - `WORKQ_LOG_LEVEL=<level>` — off/error/warn/info/debug/trace (or 0-5).
//! - `WORKQ_LOG_TIME=1` — prefix each line with a monotonic nanosecond count.
//! - `WORKQ_FLUSH_LOG=1` — flush stderr after every line.

use crate::env::env_get_bool;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::Instant;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => LogLevel::Off,
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            LogLevel::Off => "",
            LogLevel::Error => "[ERROR]",
            LogLevel::Warn => "[WARN] ",
            LogLevel::Info => "[INFO] ",
            LogLevel::Debug => "[DEBUG]",
            LogLevel::Trace => "[TRACE]",
        }
    }
}

static FLUSH_ENABLED: AtomicBool = AtomicBool::new(false);
static TIME_ENABLED: AtomicBool = AtomicBool::new(false);
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);
static INITIALIZED: AtomicBool = AtomicBool::new(false);

static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

pub fn init() {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }
    START_TIME.get_or_init(Instant::now);
    FLUSH_ENABLED.store(env_get_bool("WORKQ_FLUSH_LOG", false), Ordering::Relaxed);
    TIME_ENABLED.store(env_get_bool("WORKQ_LOG_TIME", false), Ordering::Relaxed);

    if let Ok(val) = std::env::var("WORKQ_LOG_LEVEL") {
        let level = match val.to_lowercase().as_str() {
            "off" | "0" => LogLevel::Off,
            "error" | "1" => LogLevel::Error,
            "warn" | "2" => LogLevel::Warn,
            "info" | "3" => LogLevel::Info,
            "debug" | "4" => LogLevel::Debug,
            "trace" | "5" => LogLevel::Trace,
            _ => LogLevel::Info,
        };
        LOG_LEVEL.store(level as u8, Ordering::Relaxed);
    }
}

#[inline]
fn flush_enabled() -> bool {
    if !INITIALIZED.load(Ordering::Relaxed) {
        init();
    }
    FLUSH_ENABLED.load(Ordering::Relaxed)
}

#[inline]
fn time_enabled() -> bool {
    if !INITIALIZED.load(Ordering::Relaxed) {
        init();
    }
    TIME_ENABLED.load(Ordering::Relaxed)
}

#[inline]
pub fn log_level() -> LogLevel {
    if !INITIALIZED.load(Ordering::Relaxed) {
        init();
    }
    LogLevel::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

pub fn set_log_level(level: LogLevel) {
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

#[inline]
fn level_enabled(level: LogLevel) -> bool {
    level as u8 <= log_level() as u8
}

#[inline]
fn elapsed_ns() -> u64 {
    let start = START_TIME.get_or_init(Instant::now);
    start.elapsed().as_nanos() as u64
}

thread_local! {
    static WORKER_ID: std::cell::Cell<Option<usize>> = const { std::cell::Cell::new(None) };
}

/// Set the worker index for this thread (called once by the worker loop).
pub fn set_worker_id(id: usize) {
    WORKER_ID.with(|w| w.set(Some(id)));
}

pub fn clear_worker_id() {
    WORKER_ID.with(|w| w.set(None));
}

#[inline]
pub fn get_worker_id() -> Option<usize> {
    WORKER_ID.with(|w| w.get())
}

fn format_context() -> String {
    match get_worker_id() {
        Some(id) => format!("[w{}]", id),
        None => "[loop]".to_string(),
    }
}

#[doc(hidden)]
pub fn _wlog_impl(level: LogLevel, args: std::fmt::Arguments<'_>) {
    if !level_enabled(level) {
        return;
    }
    let stderr = std::io::stderr();
    let mut handle = stderr.lock();
    let _ = write!(handle, "{} ", level.prefix());
    if time_enabled() {
        let _ = write!(handle, "[{}] ", elapsed_ns());
    }
    let _ = write!(handle, "{} ", format_context());
    let _ = handle.write_fmt(args);
    let _ = handle.write_all(b"\n");
    if flush_enabled() {
        let _ = handle.flush();
    }
}

/// Error-level log with worker context.
#[macro_export]
macro_rules! werror {
    ($($arg:tt)*) => {{
        $crate::log::_wlog_impl($crate::log::LogLevel::Error, format_args!($($arg)*));
    }};
}

/// Warning-level log with worker context.
#[macro_export]
macro_rules! wwarn {
    ($($arg:tt)*) => {{
        $crate::log::_wlog_impl($crate::log::LogLevel::Warn, format_args!($($arg)*));
    }};
}

/// Info-level log with worker context.
#[macro_export]
macro_rules! winfo {
    ($($arg:tt)*) => {{
        $crate::log::_wlog_impl($crate::log::LogLevel::Info, format_args!($($arg)*));
    }};
}

/// Debug-level log with worker context.
#[macro_export]
macro_rules! wdebug {
    ($($arg:tt)*) => {{
        $crate::log::_wlog_impl($crate::log::LogLevel::Debug, format_args!($($arg)*));
    }};
}

/// Trace-level log with worker context.
#[macro_export]
macro_rules! wtrace {
    ($($arg:tt)*) => {{
        $crate::log::_wlog_impl($crate::log::LogLevel::Trace, format_args!($($arg)*));
    }};
}
