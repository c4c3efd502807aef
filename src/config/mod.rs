//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! ingest.toml (optional)
//!     → loader.rs (parse & deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → shared via AppState to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - DATABASE_URL / API_TOKEN / SECRET_KEY / BIND_ADDRESS override the file

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_runtime_config, ConfigError};
pub use schema::AppConfig;
pub use schema::AuthConfig;
pub use schema::ListenerConfig;
pub use schema::LoginGuardConfig;
pub use schema::ObservabilityConfig;
