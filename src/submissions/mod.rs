//! Form submission handling.
//!
//! # Data Flow
//! ```text
//! FormFields (raw)
//!     → types.rs (sanitized QuoteForm / email)
//!     → validation.rs (required fields, syntax, length)
//!     → service.rs (rate limit, persist, notify)
//!     → Accepted | SubmissionError
//! ```

pub mod service;
pub mod types;
pub mod validation;

pub use service::{SubmissionError, SubmissionService};
pub use types::{Accepted, Action, FormFields, QuoteForm};
pub use validation::ValidationError;
