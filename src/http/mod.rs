//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (client identifier, content preference)
//!     → auth / data / admin routers
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::{ClientInfo, X_FORWARDED_FOR};
pub use server::{AppState, HttpServer};

pub const X_REQUEST_ID: &str = "x-request-id";
