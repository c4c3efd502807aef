//! SQLite persistence.
//!
//! # Data Flow
//! ```text
//! handlers
//!     → RecordStore / UserStore (async facade)
//!     → Database::call (spawn_blocking + connection mutex)
//!     → records.rs / users.rs (plain functions over rusqlite::Connection)
//! ```
//!
//! # Design Decisions
//! - One connection behind a mutex: a replace holds it for the whole
//!   transaction, so readers never see a half-applied batch
//! - Blocking SQLite work runs on tokio's blocking pool

pub mod records;
pub mod schema;
pub mod users;

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use thiserror::Error;

pub use records::{DataRecord, RecordStore};
pub use users::{User, UserStore};

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("payload encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("password hashing error: {0}")]
    Password(#[from] crate::auth::password::PasswordError),

    #[error("database connection mutex poisoned")]
    Poisoned,

    #[error("database task failed: {0}")]
    Task(String),
}

/// Shared handle to the SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database at `url` and ensure the schema exists.
    ///
    /// `:memory:` opens a private in-memory database.
    pub fn open(url: &str) -> Result<Self, StorageError> {
        let path = url.strip_prefix("sqlite://").unwrap_or(url);
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        schema::create_all_tables(&conn)?;

        tracing::info!(database = %path, "Database ready");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    pub async fn call<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StorageError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StorageError::Poisoned)?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
    }

    /// Run `f` on the current thread. For CLI tools and tests outside a runtime.
    pub fn call_blocking<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StorageError>,
    {
        let mut guard = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        f(&mut guard)
    }
}
