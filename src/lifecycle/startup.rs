//! Startup orchestration.
//!
//! Config is already validated; this opens storage and builds the shared
//! state in dependency order. Any error is fatal.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::SessionStore;
use crate::config::AppConfig;
use crate::http::server::AppState;
use crate::security::{FailureTracker, GuardPolicy, LoginGuard};
use crate::storage::{Database, RecordStore, StorageError, UserStore};

/// Build application state with the default in-memory login guard.
pub fn build_state(config: AppConfig) -> Result<AppState, StorageError> {
    let guard = Arc::new(FailureTracker::new(GuardPolicy::from(&config.login_guard)));
    build_state_with_guard(config, guard)
}

/// Build application state around a caller-supplied login guard.
pub fn build_state_with_guard(
    config: AppConfig,
    login_guard: Arc<dyn LoginGuard>,
) -> Result<AppState, StorageError> {
    let db = Database::open(&config.database.url)?;

    let sessions = Arc::new(SessionStore::new(
        &config.auth.secret_key,
        Duration::from_secs(config.auth.session_ttl_secs),
        config.auth.cookie_secure,
    ));

    tracing::info!(
        max_fails = config.login_guard.max_fails,
        window_secs = config.login_guard.window_secs,
        block_secs = config.login_guard.block_secs,
        "Login guard configured"
    );

    Ok(AppState {
        records: RecordStore::new(db.clone()),
        users: UserStore::new(db),
        sessions,
        login_guard,
        config: Arc::new(config),
    })
}
