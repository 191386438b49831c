//! `/api/forms` and `/health` handlers.

use std::time::Instant;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::http::request::FormSubmission;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::submissions::Action;

/// Dispatch a submission to the handler named by its `action`.
pub async fn submit_form(State(state): State<AppState>, submission: FormSubmission) -> Response {
    let action = match submission.action.as_deref().map(str::parse::<Action>) {
        Some(Ok(action)) => action,
        _ => {
            tracing::debug!(client = %submission.client_ip, "Rejected submission with unknown action");
            return ApiError::INVALID_ACTION.into_response();
        }
    };

    let start = Instant::now();
    let result = match action {
        Action::Quote => {
            state
                .service
                .handle_quote(&submission.client_ip, &submission.fields)
                .await
        }
        Action::Subscribe => {
            state
                .service
                .handle_subscribe(&submission.client_ip, &submission.fields)
                .await
        }
    };

    let response = match result {
        Ok(accepted) => accepted.into_response(),
        Err(e) => {
            tracing::debug!(action = %action, client = %submission.client_ip, reason = %e, "Submission rejected");
            ApiError::from_submission(action, &e).into_response()
        }
    };

    metrics::record_submission(action.as_str(), response.status().as_u16(), start);
    response
}

/// Liveness check.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "storage": state.service.backend(),
    }))
}
