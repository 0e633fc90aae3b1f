//! Shared test utilities for unit tests
//!
//! Integration tests in `tests/` cannot see this module and carry their own
//! helpers in `tests/common/mod.rs`.

use chrono::{DateTime, TimeZone, Utc};
use std::env;
use std::sync::Mutex;

use crate::types::{Action, ActionKind};

// Serializes environment variable modifications across tests
pub static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Instant `secs` seconds after the Unix epoch
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

/// Action of `kind` at `secs` seconds after the Unix epoch
pub fn action(kind: ActionKind, secs: i64) -> Action {
    Action::new(kind, at(secs))
}

/// RAII guard for environment variable manipulation in tests
///
/// Restores the original values on drop, even if the test panics.
pub struct EnvVarGuard {
    vars: Vec<(String, Option<String>)>,
}

impl EnvVarGuard {
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    /// Set an environment variable, remembering its original value
    pub fn set(&mut self, key: &str, value: &str) {
        let original = env::var(key).ok();
        self.vars.push((key.to_string(), original));
        // env::set_var is unsafe since Rust 2024 due to thread-safety concerns
        unsafe {
            env::set_var(key, value);
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        for (key, value) in self.vars.iter().rev() {
            unsafe {
                match value {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
        }
    }
}

impl Default for EnvVarGuard {
    fn default() -> Self {
        Self::new()
    }
}
