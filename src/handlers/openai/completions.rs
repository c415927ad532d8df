//! OpenAI-compatible chat completions handler
//!
//! Handles POST /chat/completions requests (both streaming and non-streaming).

use crate::error::GatewayError;
use crate::handlers::AppState;
use crate::handlers::extractor::GatewayJson;
use crate::metrics::Surface;
use crate::middleware::RequestId;
use axum::{
    Extension, Json,
    extract::State,
    response::{IntoResponse, Response},
};

use super::types::{ChatCompletion, ChatCompletionRequest, current_timestamp};

/// POST /chat/completions handler
///
/// Dispatches to the SSE variant when `stream: true`; otherwise drives a
/// full completion through the orchestrator and wraps it in the OpenAI
/// envelope. The `model` reported back is the model that actually served
/// the request, which may be a substitute when the requested one was
/// unavailable.
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    GatewayJson(request): GatewayJson<ChatCompletionRequest>,
) -> Result<Response, GatewayError> {
    tracing::debug!(
        request_id = %request_id,
        model = ?request.model,
        messages_count = request.messages.len(),
        stream = request.stream,
        "received chat completions request"
    );

    state.metrics().record_request(Surface::OpenAi, request.stream);

    let conversation = request.conversation();
    if conversation.is_empty() {
        return Err(GatewayError::Validation(
            "messages cannot be empty".to_string(),
        ));
    }

    if request.stream {
        return super::streaming::handler(state, request_id, request.model, conversation).await;
    }

    let prompt_chars: usize = conversation.iter().map(|m| m.content_length()).sum();
    let completion = state
        .orchestrator()
        .complete(request.model.as_deref(), &conversation)
        .await?;

    let created = current_timestamp();
    let response = ChatCompletion::new(completion.content, completion.model, prompt_chars, created);

    tracing::info!(
        request_id = %request_id,
        model = %response.model,
        response_length = response.choices[0].message.content.len(),
        "chat completion successful"
    );

    Ok(Json(response).into_response())
}
