//! Models endpoint handler
//!
//! Exposes the availability cache via GET /models in the familiar
//! OpenAI-flavored list envelope, extended with the cached state and
//! measured latency of each model.

use crate::handlers::AppState;
use crate::providers::ModelState;
use axum::{Json, extract::State};
use serde::Serialize;

/// Response for GET /models
#[derive(Serialize)]
pub struct ModelsResponse {
    pub object: &'static str,
    pub data: Vec<ModelInfo>,
}

/// One cached model as reported to clients
#[derive(Serialize)]
pub struct ModelInfo {
    pub id: String,
    pub object: &'static str,
    pub state: ModelState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// GET /models handler
pub async fn handler(State(state): State<AppState>) -> Json<ModelsResponse> {
    let entries = state.orchestrator().catalog().snapshot().await;

    let data: Vec<ModelInfo> = entries
        .into_iter()
        .map(|entry| ModelInfo {
            id: entry.name,
            object: "model",
            state: entry.state,
            latency_ms: entry.latency.map(|d| d.as_millis() as u64),
        })
        .collect();

    tracing::debug!(
        total_models = data.len(),
        enabled_count = data
            .iter()
            .filter(|m| m.state == ModelState::Enabled)
            .count(),
        "serving availability cache contents"
    );

    Json(ModelsResponse {
        object: "list",
        data,
    })
}
