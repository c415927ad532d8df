//! Prometheus metrics endpoint
//!
//! Exposes the gateway's metrics registry in text exposition format.

use crate::handlers::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// GET /metrics handler
pub async fn handler(State(state): State<AppState>) -> Response {
    match state.metrics().export() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "metrics encoding failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
