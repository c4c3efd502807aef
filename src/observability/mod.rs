//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, optional flat log file)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout / log file
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Authentication failures always carry client identifier and user-agent
//! - Request ID (`x-request-id`) is attached to every request span

pub mod logging;
pub mod metrics;
