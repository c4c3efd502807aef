//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! POST /login:
//!     → login_guard.rs (is the client identifier blocked?)
//!     → credential check (auth::handlers)
//!     → login_guard.rs (record failure / clear on success)
//! ```
//!
//! # Design Decisions
//! - Fail closed: a blocked identifier is rejected before credentials are read
//! - State is process-local and injected as `Arc<dyn LoginGuard>`
//! - Time comes from a `Clock` so windows can be tested without sleeping

pub mod clock;
pub mod login_guard;

pub use clock::{Clock, ManualClock, SystemClock};
pub use login_guard::{FailureTracker, GuardPolicy, GuardSummary, LoginGuard};
