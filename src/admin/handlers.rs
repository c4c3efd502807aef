use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::error::AppError;
use crate::http::server::AppState;
use crate::security::GuardSummary;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
    pub records: usize,
    pub active_sessions: usize,
    pub login_guard: GuardSummary,
}

#[derive(Debug, Serialize)]
pub struct UnblockResponse {
    pub identifier: String,
    pub was_blocked: bool,
}

pub async fn get_status(State(state): State<AppState>) -> Result<Json<SystemStatus>, AppError> {
    Ok(Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
        records: state.records.count().await?,
        active_sessions: state.sessions.active(),
        login_guard: state.login_guard.summary(),
    }))
}

/// Manual override: lift a block and forget the failure history.
pub async fn unblock(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Json<UnblockResponse> {
    let was_blocked = state.login_guard.is_blocked(&identifier);
    state.login_guard.unblock(&identifier);
    tracing::info!(client = %identifier, was_blocked, "Client unblocked by admin");

    Json(UnblockResponse {
        identifier,
        was_blocked,
    })
}
