//! Anthropic-compatible request and streaming event types
//!
//! The `/v1/messages` endpoint always streams; its SSE events follow the
//! Anthropic messages protocol with named events and a JSON payload per
//! event. Only the text-generation subset of the protocol is produced.

use crate::providers::{Message, Role};
use serde::{Deserialize, Serialize};

/// Messages request body
///
/// A `system` string, if present, is prepended to the conversation as a user
/// message (matching the original gateway's behavior on this surface).
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesRequest {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub system: Option<String>,
}

impl MessagesRequest {
    /// The conversation with any `system` field prepended at index 0
    pub fn conversation(&self) -> Vec<Message> {
        let mut messages = self.messages.clone();
        if let Some(system) = &self.system {
            messages.insert(0, Message::new(Role::User, system.clone()));
        }
        messages
    }
}

/// Response body for the synchronous /v1/direct variant
#[derive(Debug, Clone, Serialize)]
pub struct DirectResponse {
    #[serde(rename = "translatedText")]
    pub translated_text: String,
}

/// Message skeleton carried by `message_start`
#[derive(Debug, Clone, Serialize)]
pub struct MessageSkeleton {
    pub id: String,
    #[serde(rename = "type")]
    pub message_type: &'static str,
    pub role: &'static str,
    pub content: Vec<ContentBlock>,
    pub model: String,
    pub stop_reason: Option<String>,
    pub stop_sequence: Option<String>,
    pub usage: StartUsage,
}

impl MessageSkeleton {
    pub fn new(id: String, model: String, input_tokens: u64) -> Self {
        Self {
            id,
            message_type: "message",
            role: "assistant",
            content: Vec::new(),
            model,
            stop_reason: None,
            stop_sequence: None,
            usage: StartUsage {
                input_tokens,
                output_tokens: 1,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StartUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// A content block inside a message or `content_block_start`
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
}

/// Delta payload inside `content_block_delta`
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Delta {
    #[serde(rename = "text_delta")]
    TextDelta { text: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageDeltaBody {
    pub stop_reason: Option<String>,
    pub stop_sequence: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeltaUsage {
    pub output_tokens: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    pub error_type: &'static str,
    pub message: String,
}

/// SSE events sent to the client, in protocol order
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    #[serde(rename = "message_start")]
    MessageStart { message: MessageSkeleton },
    #[serde(rename = "content_block_start")]
    ContentBlockStart {
        index: usize,
        content_block: ContentBlock,
    },
    #[serde(rename = "ping")]
    Ping,
    #[serde(rename = "content_block_delta")]
    ContentBlockDelta { index: usize, delta: Delta },
    #[serde(rename = "content_block_stop")]
    ContentBlockStop { index: usize },
    #[serde(rename = "message_delta")]
    MessageDelta {
        delta: MessageDeltaBody,
        usage: DeltaUsage,
    },
    #[serde(rename = "message_stop")]
    MessageStop,
    #[serde(rename = "error")]
    Error { error: ErrorBody },
}

impl StreamEvent {
    /// The SSE `event:` name for this payload
    pub fn event_name(&self) -> &'static str {
        match self {
            StreamEvent::MessageStart { .. } => "message_start",
            StreamEvent::ContentBlockStart { .. } => "content_block_start",
            StreamEvent::Ping => "ping",
            StreamEvent::ContentBlockDelta { .. } => "content_block_delta",
            StreamEvent::ContentBlockStop { .. } => "content_block_stop",
            StreamEvent::MessageDelta { .. } => "message_delta",
            StreamEvent::MessageStop => "message_stop",
            StreamEvent::Error { .. } => "error",
        }
    }
}
