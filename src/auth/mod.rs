//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Browser:  POST /login → handlers.rs → session.rs (signed cookie)
//!           GET /       → guard.rs::require_session → handler
//! Machine:  POST /data  → guard.rs::require_token   → handler
//! ```
//!
//! # Design Decisions
//! - Two independent guards, chosen per route, never combined
//! - Passwords stored as Argon2id PHC strings
//! - Token comparison is constant time and exact (no trimming, no case folding)

pub mod guard;
pub mod handlers;
pub mod password;
pub mod session;

pub use guard::{require_session, require_token, GuardDecision};
pub use session::{CurrentUser, SessionStore};
