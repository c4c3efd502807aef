//! Record ingestion and viewing.
//!
//! `POST /data` sits behind the token guard and replaces the record set;
//! `GET /` sits behind the session guard and renders it as a table that
//! can be searched, filtered and sorted through the query string.

pub mod handlers;
pub mod query;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::auth::{require_session, require_token};
use crate::http::server::AppState;
use self::handlers::*;

pub fn setup_data_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/data", post(ingest))
        .layer(middleware::from_fn_with_state(state.clone(), require_token));

    let browser = Router::new()
        .route("/", get(show_table))
        .layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .merge(api)
        .merge(browser)
        .route("/health", get(health))
        .with_state(state)
}
