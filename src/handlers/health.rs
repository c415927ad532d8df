//! Health check endpoint
//!
//! Provides a simple health check for monitoring and load balancers.

use axum::Json;

/// GET /health handler
pub async fn handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
