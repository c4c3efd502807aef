//! Server-side sessions carried by a signed cookie.
//!
//! The cookie holds `<session uuid>.<hex hmac-sha256(uuid)>`, keyed by the
//! process secret. The uuid indexes an in-memory entry holding the bound
//! user id; logout or expiry removes the entry, which invalidates the cookie
//! even if the client keeps sending it.

use std::time::{Duration, Instant};

use axum::http::{header, HeaderMap};
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::config::validation::MAX_DURATION_SECS;

pub const SESSION_COOKIE: &str = "session";

type HmacSha256 = Hmac<Sha256>;

/// Identity attached to requests that passed the session guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: i64,
    pub username: String,
}

#[derive(Debug, Clone)]
struct SessionEntry {
    user: CurrentUser,
    expires_at: Instant,
}

pub struct SessionStore {
    sessions: DashMap<Uuid, SessionEntry>,
    key: Vec<u8>,
    ttl: Duration,
    secure: bool,
}

impl SessionStore {
    pub fn new(secret: &str, ttl: Duration, secure: bool) -> Self {
        Self {
            sessions: DashMap::new(),
            key: secret.as_bytes().to_vec(),
            ttl: ttl.min(Duration::from_secs(MAX_DURATION_SECS)),
            secure,
        }
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length.
        HmacSha256::new_from_slice(&self.key).expect("hmac key of any length is valid")
    }

    fn sign(&self, id: &Uuid) -> String {
        let mut mac = self.mac();
        mac.update(id.as_bytes());
        format!("{}.{}", id, hex::encode(mac.finalize().into_bytes()))
    }

    /// Recover the session id from a cookie value if its signature is valid.
    fn verify(&self, value: &str) -> Option<Uuid> {
        let (id, signature) = value.split_once('.')?;
        let id = Uuid::parse_str(id).ok()?;
        let signature = hex::decode(signature).ok()?;

        let mut mac = self.mac();
        mac.update(id.as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(id)
    }

    /// Bind a new session to `user`. Returns the signed cookie value.
    pub fn create(&self, user: CurrentUser) -> String {
        let id = Uuid::new_v4();
        self.sessions.insert(
            id,
            SessionEntry {
                user,
                expires_at: Instant::now() + self.ttl,
            },
        );
        self.sign(&id)
    }

    /// The user bound to a cookie value, if the session is live.
    pub fn resolve(&self, value: &str) -> Option<CurrentUser> {
        let id = self.verify(value)?;
        let entry = self.sessions.get(&id)?;
        if entry.expires_at > Instant::now() {
            return Some(entry.user.clone());
        }
        drop(entry);
        self.sessions.remove(&id);
        None
    }

    pub fn resolve_headers(&self, headers: &HeaderMap) -> Option<CurrentUser> {
        session_cookie(headers).and_then(|value| self.resolve(value))
    }

    /// Destroy the session named by a cookie value. Unknown values are ignored.
    pub fn destroy(&self, value: &str) {
        if let Some(id) = self.verify(value) {
            self.sessions.remove(&id);
        }
    }

    /// Drop expired sessions. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.sessions.len())
    }

    pub fn active(&self) -> usize {
        self.sessions.len()
    }

    /// `Set-Cookie` value installing `value`.
    pub fn set_cookie(&self, value: &str) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE,
            value,
            self.ttl.as_secs()
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// `Set-Cookie` value removing the session cookie.
    pub fn clear_cookie(&self) -> String {
        format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
    }
}

/// Value of the session cookie among the request's `Cookie` headers.
pub fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}
