//! Runtime abstraction for process-wide state the library reads.
//!
//! The only such state is the environment (proxy settings). Going through a
//! trait keeps it injectable and lets tests run without touching the real
//! process environment.

mod env;

use std::env as std_env;

#[cfg_attr(test, mockall::automock)]
pub trait Runtime: Send + Sync {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError>;
}

/// Returns the variable's value, treating unset, non-unicode and blank
/// values alike as absent.
pub fn env_value<R: Runtime + ?Sized>(runtime: &R, key: &str) -> Option<String> {
    runtime
        .env_var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// [`Runtime`] backed by the real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError> {
        self.env_var_impl(key)
    }
}
