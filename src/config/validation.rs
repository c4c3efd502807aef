//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and required
//! secrets. All problems are collected, not just the first.

use std::fmt;

use crate::config::schema::AppConfig;

/// Minimum accepted length of the session signing secret.
pub const MIN_SECRET_LEN: usize = 16;

/// Longest accepted duration setting: ten years.
pub const MAX_DURATION_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn check_duration(errors: &mut Vec<ValidationError>, field: &'static str, secs: u64) {
    if secs == 0 {
        errors.push(ValidationError::new(field, "must be > 0"));
    } else if secs > MAX_DURATION_SECS {
        errors.push(ValidationError::new(
            field,
            format!("must be at most {} seconds", MAX_DURATION_SECS),
        ));
    }
}

/// Check a loaded configuration before it is accepted.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.database.url.trim().is_empty() {
        errors.push(ValidationError::new("database.url", "must not be empty"));
    }
    if config.auth.api_token.is_empty() {
        errors.push(ValidationError::new("auth.api_token", "must be set (API_TOKEN)"));
    }
    if config.auth.secret_key.len() < MIN_SECRET_LEN {
        errors.push(ValidationError::new(
            "auth.secret_key",
            format!("must be at least {} bytes", MIN_SECRET_LEN),
        ));
    }
    check_duration(&mut errors, "auth.session_ttl_secs", config.auth.session_ttl_secs);
    if config.login_guard.max_fails == 0 {
        errors.push(ValidationError::new("login_guard.max_fails", "must be >= 1"));
    }
    check_duration(&mut errors, "login_guard.window_secs", config.login_guard.window_secs);
    check_duration(&mut errors, "login_guard.block_secs", config.login_guard.block_secs);
    check_duration(&mut errors, "timeouts.request_secs", config.timeouts.request_secs);
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be > 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
