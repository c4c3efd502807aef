//! Route guards: browser sessions and the static API token.
//!
//! Each guard is a pure check returning a [`GuardDecision`] plus a thin axum
//! middleware that maps the decision to a response. A route is wrapped by
//! one guard or the other, never both.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use subtle::ConstantTimeEq;

use crate::auth::session::{CurrentUser, SessionStore};
use crate::error::AppError;
use crate::http::request::{wants_html, ClientInfo};
use crate::http::server::AppState;

/// Outcome of a guard check.
#[derive(Debug)]
pub enum GuardDecision<T> {
    Allow(T),
    Deny(AppError),
}

const BEARER_PREFIX: &str = "Bearer ";

/// Require `Authorization: Bearer <expected>`, byte for byte.
pub fn check_bearer(headers: &HeaderMap, expected: &str) -> GuardDecision<()> {
    let token = match headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
    {
        Some(token) => token,
        None => return GuardDecision::Deny(AppError::MissingToken),
    };

    if bool::from(token.as_bytes().ct_eq(expected.as_bytes())) {
        GuardDecision::Allow(())
    } else {
        GuardDecision::Deny(AppError::InvalidToken)
    }
}

/// Require a live session cookie.
pub fn check_session(headers: &HeaderMap, sessions: &SessionStore) -> GuardDecision<CurrentUser> {
    match sessions.resolve_headers(headers) {
        Some(user) => GuardDecision::Allow(user),
        None => GuardDecision::Deny(AppError::NotLoggedIn),
    }
}

/// Token guard for machine clients.
pub async fn require_token(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match check_bearer(request.headers(), &state.config.auth.api_token) {
        GuardDecision::Allow(()) => next.run(request).await,
        GuardDecision::Deny(err) => {
            let client = ClientInfo::from_request(&request);
            tracing::warn!(
                client = %client.identifier,
                user_agent = %client.user_agent,
                path = %request.uri().path(),
                reason = %err,
                "API token rejected"
            );
            crate::observability::metrics::record_token_rejected(&err);
            err.into_response()
        }
    }
}

/// Session guard for browser users.
///
/// Inserts [`CurrentUser`] into the request extensions on success. On
/// failure, HTML callers are redirected to `/login`; everyone else gets 401.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match check_session(request.headers(), &state.sessions) {
        GuardDecision::Allow(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        GuardDecision::Deny(err) => {
            if wants_html(request.headers()) {
                Redirect::to("/login").into_response()
            } else {
                err.into_response()
            }
        }
    }
}
