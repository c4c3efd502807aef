//! Login and logout.
//!
//! ```text
//! POST /login
//!     → blocked?            yes → 403 too many attempts (credentials never read)
//!     → fields present?     no  → 400 missing credentials
//!     → user + password ok? no  → record failure, 401 invalid credentials
//!     → bind session, clear failures, 200 / redirect
//! ```
//! JSON bodies get JSON replies; form posts get the HTML login page or a redirect.

use axum::{
    body::Body,
    extract::{FromRequest, Query, State},
    http::{header, HeaderMap, Request, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::password::verify_in_background;
use crate::auth::session::{session_cookie, CurrentUser};
use crate::error::AppError;
use crate::http::request::{is_json, ClientInfo};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::views::{login_page, Notice};

/// Submitted credentials. Either field may be absent.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct LoginPayload {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub logged_out: Option<String>,
}

/// GET /login
pub async fn login_form(Query(query): Query<LoginQuery>) -> Html<String> {
    let notice = query.logged_out.map(|_| Notice::Info("You have been logged out"));
    Html(login_page(notice, ""))
}

/// POST /login
pub async fn login(State(state): State<AppState>, client: ClientInfo, request: Request<Body>) -> Response {
    let json_mode = is_json(request.headers());
    let previous = session_cookie(request.headers()).map(str::to_owned);
    let payload = read_payload(&state, json_mode, request).await;
    let username = payload.username.clone().unwrap_or_default();

    match authenticate(&state, &client, payload).await {
        Ok(user) => {
            if let Some(previous) = previous {
                state.sessions.destroy(&previous);
            }
            let cookie = state.sessions.create(user);
            let set_cookie = [(header::SET_COOKIE, state.sessions.set_cookie(&cookie))];
            if json_mode {
                (set_cookie, Json(json!({ "message": "login successful" }))).into_response()
            } else {
                (set_cookie, Redirect::to("/")).into_response()
            }
        }
        Err(err) if json_mode => err.into_response(),
        Err(err) => (
            err.status(),
            Html(login_page(Some(Notice::Error(&err.public_message())), &username)),
        )
            .into_response(),
    }
}

/// Parse the body as JSON or urlencoded form. Unparseable bodies count as empty.
async fn read_payload(state: &AppState, json_mode: bool, request: Request<Body>) -> LoginPayload {
    let parsed = if json_mode {
        Json::<LoginPayload>::from_request(request, state)
            .await
            .map(|Json(p)| p)
            .map_err(|e| e.body_text())
    } else {
        Form::<LoginPayload>::from_request(request, state)
            .await
            .map(|Form(p)| p)
            .map_err(|e| e.body_text())
    };

    parsed.unwrap_or_else(|reason| {
        tracing::debug!(reason = %reason, "Unreadable login body");
        LoginPayload::default()
    })
}

/// The login state machine, independent of response format.
pub async fn authenticate(
    state: &AppState,
    client: &ClientInfo,
    payload: LoginPayload,
) -> Result<CurrentUser, AppError> {
    let ip = client.identifier.as_str();

    if state.login_guard.is_blocked(ip) {
        tracing::warn!(
            client = %ip,
            user_agent = %client.user_agent,
            blocked_until = ?state.login_guard.blocked_until(ip),
            "Login rejected: client blocked"
        );
        metrics::record_login_attempt("blocked");
        return Err(AppError::TooManyAttempts);
    }

    let (username, password) = match (payload.username, payload.password) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
        _ => {
            tracing::info!(client = %ip, user_agent = %client.user_agent, "Login rejected: missing credentials");
            metrics::record_login_attempt("missing_credentials");
            return Err(AppError::MissingCredentials);
        }
    };

    let user = state.users.find_by_username(&username).await?;
    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
    let verified = verify_in_background(password, stored_hash).await;

    let Some(user) = user.filter(|_| verified) else {
        let blocked_now = state.login_guard.record_failure(ip);
        tracing::warn!(
            client = %ip,
            user_agent = %client.user_agent,
            username = %username,
            blocked_now,
            "Login failed: invalid credentials"
        );
        metrics::record_login_attempt("invalid_credentials");
        if blocked_now {
            metrics::record_login_block();
        }
        return Err(AppError::InvalidCredentials);
    };

    state.login_guard.clear_failures(ip);
    tracing::info!(
        client = %ip,
        user_agent = %client.user_agent,
        username = %user.username,
        "Login succeeded"
    );
    metrics::record_login_attempt("success");

    Ok(CurrentUser {
        user_id: user.id,
        username: user.username,
    })
}

/// GET /logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(value) = session_cookie(&headers) {
        state.sessions.destroy(value);
    }
    (
        StatusCode::SEE_OTHER,
        [
            (header::SET_COOKIE, state.sessions.clear_cookie()),
            (header::LOCATION, "/login?logged_out=1".to_string()),
        ],
    )
        .into_response()
}
