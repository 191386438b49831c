//! CSRF token gate.
//!
//! When enabled, POST submissions must carry a non-empty `X-CSRF-Token`
//! header. Issuing and verifying the token against a session happens
//! outside this service; this layer only refuses requests that arrive
//! without one.

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::response::ApiError;

/// Header carrying the token.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// State for the CSRF gate.
#[derive(Debug, Clone, Copy)]
pub struct CsrfState {
    pub enabled: bool,
}

pub async fn csrf_middleware(
    State(state): State<CsrfState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.enabled || request.method() != Method::POST {
        return next.run(request).await;
    }

    let has_token = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| !v.trim().is_empty());

    if has_token {
        next.run(request).await
    } else {
        tracing::warn!(path = %request.uri().path(), "Submission rejected: missing CSRF token");
        ApiError::MISSING_CSRF_TOKEN.into_response()
    }
}
