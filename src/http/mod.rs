//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (client IP, action, body decoding)
//!     → forms.rs (action dispatch)
//!     → [submissions service]
//!     → response.rs (JSON body, status mapping)
//!     → Send to client
//! ```

pub mod forms;
pub mod request;
pub mod response;
pub mod server;

pub use request::{ClientIpPolicy, FormSubmission, X_REQUEST_ID};
pub use response::{ApiError, ApiResponse};
pub use server::{AppState, HttpServer};
