//! Data ingestion service.
//!
//! Machine clients replace the stored record set with `POST /data` using a
//! static bearer token; browser users log in and view the records as an
//! HTML table. Logins are protected by a per-client failure tracker that
//! temporarily blocks identifiers after repeated failures.

pub mod admin;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod storage;
pub mod views;

pub use config::schema::AppConfig;
pub use error::AppError;
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
