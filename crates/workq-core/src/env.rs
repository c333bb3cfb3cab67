//! Environment variable utilities.
//!
//! Generic `env_get<T>` for parsing environment variables with a default,
//! used both for `UV_THREADPOOL_SIZE` and for the diagnostic knobs in
//! [`crate::log`].

use std::str::FromStr;

/// Get environment variable parsed as type `T`, or return the default.
#[inline]
pub fn env_get<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Get environment variable as boolean.
///
/// Accepts "1", "true", "yes", "on" (case-insensitive) as true; everything
/// else, including unset, returns the default.
#[inline]
pub fn env_get_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

/// Get environment variable as an optional parsed value.
#[inline]
pub fn env_get_opt<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
