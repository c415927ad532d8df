//! OpenAI-compatible streaming chat completions
//!
//! Renders the orchestrator's increment stream as Server-Sent Events:
//! an initial role chunk, one content chunk per increment, a finish chunk,
//! and the terminal `data: [DONE]` line exactly once. Failures after the
//! stream has opened are delivered as a final in-band `error` line, never
//! as an abrupt connection drop.

use crate::error::GatewayError;
use crate::handlers::AppState;
use crate::middleware::RequestId;
use crate::orchestrator::Increment;
use crate::providers::Message;
use axum::response::{
    IntoResponse, Response,
    sse::{Event, KeepAlive, Sse},
};
use futures::StreamExt;
use std::convert::Infallible;
use std::time::Duration;

use super::types::{ChatCompletionChunk, current_timestamp};

/// SSE variant of POST /chat/completions
pub async fn handler(
    state: AppState,
    request_id: RequestId,
    model: Option<String>,
    conversation: Vec<Message>,
) -> Result<Response, GatewayError> {
    let streaming = state
        .orchestrator()
        .complete_stream(model.as_deref(), conversation)
        .await?;

    let completion_id = format!("chatcmpl-{}", uuid::Uuid::new_v4().simple());
    let created = current_timestamp();
    let model = streaming.model;

    tracing::info!(
        request_id = %request_id,
        completion_id = %completion_id,
        model = %model,
        "starting streaming response"
    );

    let mut increments = streaming.increments;
    let event_stream = async_stream::stream! {
        let initial = ChatCompletionChunk::initial(&completion_id, &model, created);
        yield sse_json(&initial);

        while let Some(increment) = increments.next().await {
            match increment {
                Increment::Delta(text) => {
                    let chunk =
                        ChatCompletionChunk::content(&completion_id, &model, created, &text);
                    yield sse_json(&chunk);
                }
                Increment::Done => {
                    let finish = ChatCompletionChunk::finish(&completion_id, &model, created);
                    yield sse_json(&finish);
                    yield Ok(Event::default().data("[DONE]"));
                    break;
                }
                Increment::Failed(reason) => {
                    tracing::warn!(
                        request_id = %request_id,
                        completion_id = %completion_id,
                        reason = %reason,
                        "stream failed after opening; delivering in-band error"
                    );
                    yield sse_json(&serde_json::json!({ "error": reason }));
                    yield Ok(Event::default().data("[DONE]"));
                    break;
                }
            }
        }
    };

    Ok(Sse::new(event_stream)
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
        .into_response())
}

fn sse_json<T: serde::Serialize>(payload: &T) -> Result<Event, Infallible> {
    Ok(Event::default().data(serde_json::to_string(payload).unwrap_or_default()))
}
