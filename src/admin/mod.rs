pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use crate::auth::require_token;
use crate::http::server::AppState;
use self::handlers::*;

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/unblock/{identifier}", post(unblock))
        .layer(middleware::from_fn_with_state(state.clone(), require_token))
        .with_state(state)
}
