//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the ingest service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Database location.
    pub database: DatabaseConfig,

    /// Credentials for browser sessions and API clients.
    pub auth: AuthConfig,

    /// Login brute-force protection thresholds.
    pub login_guard: LoginGuardConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5000".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database path. `:memory:` keeps everything in process.
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "ingest.db".to_string(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Static bearer token accepted on the ingestion endpoint.
    pub api_token: String,

    /// Process secret used to sign session cookies.
    pub secret_key: String,

    /// Session lifetime in seconds.
    pub session_ttl_secs: u64,

    /// Mark the session cookie `Secure` (set when served over TLS).
    pub cookie_secure: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            // WARNING: This is a placeholder! Change this in production.
            secret_key: "CHANGE_THIS_TO_RANDOM_STRING".to_string(),
            session_ttl_secs: 8 * 60 * 60,
            cookie_secure: false,
        }
    }
}

/// Login brute-force protection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoginGuardConfig {
    /// Failures within the window that trigger a block.
    pub max_fails: usize,

    /// Sliding window over which failures are counted, in seconds.
    pub window_secs: u64,

    /// Block duration in seconds.
    pub block_secs: u64,
}

impl Default for LoginGuardConfig {
    fn default() -> Self {
        Self {
            max_fails: 5,
            window_secs: 600,
            block_secs: 600,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log format: "pretty" or "json".
    pub log_format: String,

    /// Optional flat log file, appended to alongside stdout.
    pub log_file: Option<String>,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            log_file: None,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [auth]
            api_token = "abc"

            [login_guard]
            max_fails = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.auth.api_token, "abc");
        assert_eq!(config.auth.session_ttl_secs, 8 * 60 * 60);
        assert_eq!(config.login_guard.max_fails, 3);
        assert_eq!(config.login_guard.window_secs, 600);
        assert_eq!(config.listener.bind_address, "127.0.0.1:5000");
        assert!(config.listener.tls.is_none());
    }
}
