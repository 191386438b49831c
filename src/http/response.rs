//! JSON reply bodies and the error-to-status mapping.
//!
//! # Design Decisions
//! - Every reply is `{"success": bool, "message": string}`
//! - Error messages are static strings; client input never reaches them
//! - Storage failures are logged here with their cause and answered generically

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::submissions::{Accepted, Action, SubmissionError};

/// Body of every `/api/forms` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
}

impl ApiResponse {
    pub fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }

    pub fn failure(message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
        }
    }
}

impl From<Accepted> for ApiResponse {
    fn from(accepted: Accepted) -> Self {
        Self::ok(accepted.message())
    }
}

impl IntoResponse for Accepted {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(ApiResponse::from(self))).into_response()
    }
}

/// A failed submission as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: &'static str,
}

impl ApiError {
    pub const INVALID_ACTION: Self = Self::new(StatusCode::BAD_REQUEST, "Invalid action");
    pub const INVALID_BODY: Self = Self::new(StatusCode::BAD_REQUEST, "Invalid request.");
    pub const PAYLOAD_TOO_LARGE: Self = Self::new(StatusCode::PAYLOAD_TOO_LARGE, "Request too large.");
    pub const ALREADY_SUBSCRIBED: Self = Self::new(StatusCode::BAD_REQUEST, "Already subscribed.");
    pub const MISSING_CSRF_TOKEN: Self = Self::new(StatusCode::FORBIDDEN, "Invalid request token.");
    pub const RATE_LIMITED: Self = Self::new(
        StatusCode::TOO_MANY_REQUESTS,
        "Too many requests. Please try again later.",
    );
    pub const QUOTE_FAILED: Self = Self::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Error processing request. Please try again.",
    );
    pub const SUBSCRIBE_FAILED: Self = Self::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Subscription failed. Please try again.",
    );
    pub const SERVER_ERROR: Self = Self::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Server error. Please try again.",
    );

    pub const fn new(status: StatusCode, message: &'static str) -> Self {
        Self { status, message }
    }

    /// Map a handler failure for `action` to its reply.
    pub fn from_submission(action: Action, error: &SubmissionError) -> Self {
        match error {
            SubmissionError::Validation(e) => Self::new(StatusCode::BAD_REQUEST, e.message()),
            SubmissionError::DuplicateSubscriber => Self::ALREADY_SUBSCRIBED,
            SubmissionError::RateLimited => Self::RATE_LIMITED,
            SubmissionError::Storage(e) => {
                tracing::error!(action = %action, error = %e, "Submission failed in storage");
                match action {
                    Action::Quote => Self::QUOTE_FAILED,
                    Action::Subscribe => Self::SUBSCRIBE_FAILED,
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::failure(self.message))).into_response()
    }
}
