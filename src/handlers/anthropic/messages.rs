//! Anthropic-compatible messages handlers
//!
//! `POST /v1/messages` always streams: the protocol preamble
//! (`message_start`, `content_block_start`, `ping`) goes out before the
//! first provider increment, deltas follow as `content_block_delta`, and a
//! clean finish closes with `content_block_stop`, `message_delta`, and
//! exactly one `message_stop`. A failure after the stream opens is
//! delivered as an in-band `error` event before the stream terminates.
//!
//! `POST /v1/direct` is the synchronous variant: same orchestration, full
//! text in a single JSON body.

use crate::error::GatewayError;
use crate::handlers::AppState;
use crate::handlers::extractor::GatewayJson;
use crate::metrics::Surface;
use crate::middleware::RequestId;
use crate::orchestrator::Increment;
use axum::{
    Extension, Json,
    extract::State,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures::StreamExt;
use std::convert::Infallible;
use std::time::Duration;

use super::types::{
    ContentBlock, Delta, DeltaUsage, DirectResponse, ErrorBody, MessageDeltaBody, MessageSkeleton,
    MessagesRequest, StreamEvent,
};

/// POST /v1/messages handler (always streaming)
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    GatewayJson(request): GatewayJson<MessagesRequest>,
) -> Result<Response, GatewayError> {
    state.metrics().record_request(Surface::Anthropic, true);

    let conversation = request.conversation();
    if conversation.is_empty() {
        return Err(GatewayError::Validation(
            "messages cannot be empty".to_string(),
        ));
    }

    let prompt_chars: usize = conversation.iter().map(|m| m.content_length()).sum();
    let streaming = state
        .orchestrator()
        .complete_stream(request.model.as_deref(), conversation)
        .await?;

    let model = streaming.model;
    let message_id = format!("msg_{}", uuid::Uuid::new_v4().simple());

    tracing::info!(
        request_id = %request_id,
        message_id = %message_id,
        model = %model,
        "starting messages stream"
    );

    let mut increments = streaming.increments;
    let event_stream = async_stream::stream! {
        yield sse_event(&StreamEvent::MessageStart {
            message: MessageSkeleton::new(
                message_id.clone(),
                model.clone(),
                (prompt_chars / 4) as u64,
            ),
        });
        yield sse_event(&StreamEvent::ContentBlockStart {
            index: 0,
            content_block: ContentBlock::Text {
                text: String::new(),
            },
        });
        yield sse_event(&StreamEvent::Ping);

        let mut output_chars = 0usize;
        let mut failed = false;

        while let Some(increment) = increments.next().await {
            match increment {
                Increment::Delta(text) => {
                    output_chars += text.chars().count();
                    yield sse_event(&StreamEvent::ContentBlockDelta {
                        index: 0,
                        delta: Delta::TextDelta { text },
                    });
                }
                Increment::Done => break,
                Increment::Failed(reason) => {
                    tracing::warn!(
                        request_id = %request_id,
                        message_id = %message_id,
                        reason = %reason,
                        "messages stream failed after opening"
                    );
                    yield sse_event(&StreamEvent::Error {
                        error: ErrorBody {
                            error_type: "api_error",
                            message: reason,
                        },
                    });
                    failed = true;
                    break;
                }
            }
        }

        if !failed {
            yield sse_event(&StreamEvent::ContentBlockStop { index: 0 });
            yield sse_event(&StreamEvent::MessageDelta {
                delta: MessageDeltaBody {
                    stop_reason: Some("end_turn".to_string()),
                    stop_sequence: None,
                },
                usage: DeltaUsage {
                    output_tokens: (output_chars / 4) as u64,
                },
            });
            yield sse_event(&StreamEvent::MessageStop);
        }
    };

    Ok(Sse::new(event_stream)
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
        .into_response())
}

/// POST /v1/direct handler (synchronous)
pub async fn direct_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    GatewayJson(request): GatewayJson<MessagesRequest>,
) -> Result<Json<DirectResponse>, GatewayError> {
    state.metrics().record_request(Surface::Anthropic, false);

    let conversation = request.conversation();
    if conversation.is_empty() {
        return Err(GatewayError::Validation(
            "messages cannot be empty".to_string(),
        ));
    }

    let completion = state
        .orchestrator()
        .complete(request.model.as_deref(), &conversation)
        .await?;

    tracing::info!(
        request_id = %request_id,
        model = %completion.model,
        response_length = completion.content.len(),
        "direct translation successful"
    );

    Ok(Json(DirectResponse {
        translated_text: completion.content,
    }))
}

fn sse_event(event: &StreamEvent) -> Result<Event, Infallible> {
    Ok(Event::default()
        .event(event.event_name())
        .data(serde_json::to_string(event).unwrap_or_default()))
}
