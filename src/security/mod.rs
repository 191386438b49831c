//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming submission:
//!     → csrf.rs (token header present, when enabled)
//!     → rate_limit.rs (per-IP, per-action sliding window)
//!     → sanitize.rs (trim, escape, strip control characters)
//!     → Pass to validation and persistence
//! ```
//!
//! # Design Decisions
//! - Rate limiting fails open on storage errors
//! - No trust in client input; every field is sanitized before use
//! - Error messages are fixed strings, never echo input

pub mod csrf;
pub mod rate_limit;
pub mod sanitize;

pub use rate_limit::{Clock, ManualClock, RateLimiter, SystemClock};
pub use sanitize::{sanitize_email, sanitize_text};
