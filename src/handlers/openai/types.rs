//! OpenAI-compatible request and response types
//!
//! These follow the OpenAI Chat Completions wire format, plus the `system`
//! convenience field the original deployment accepted beside `messages`.

use crate::providers::{Message, Role};
use serde::{Deserialize, Serialize};

/// Object type for non-streaming chat completion responses
pub const OBJECT_CHAT_COMPLETION: &str = "chat.completion";
/// Object type for streaming chat completion chunks
pub const OBJECT_CHAT_COMPLETION_CHUNK: &str = "chat.completion.chunk";

/// Chat completion request body
///
/// `messages` defaults to empty and `model` to the configured default, so a
/// minimal `{"messages": [...]}` body is enough. A `system` string, if
/// present, is prepended to the conversation as a system message.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionRequest {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub stream: bool,
    #[serde(default)]
    pub system: Option<String>,
}

impl ChatCompletionRequest {
    /// The conversation with any `system` field prepended at index 0
    pub fn conversation(&self) -> Vec<Message> {
        let mut messages = self.messages.clone();
        if let Some(system) = &self.system {
            messages.insert(0, Message::new(Role::System, system.clone()));
        }
        messages
    }
}

/// Current Unix timestamp for `created` fields
pub fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Usage statistics, estimated at ~4 chars/token
#[derive(Debug, Clone, Serialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    /// Estimate usage from character counts
    ///
    /// The ~4 chars/token heuristic is typical for English text; it may
    /// under- or overestimate for code or non-English content.
    pub fn estimate(prompt_chars: usize, completion_chars: usize) -> Self {
        let prompt_tokens = (prompt_chars / 4) as u32;
        let completion_tokens = (completion_chars / 4) as u32;
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Assistant message inside a completion choice
#[derive(Debug, Clone, Serialize)]
pub struct AssistantMessage {
    pub role: &'static str,
    pub content: String,
}

/// One completion choice
#[derive(Debug, Clone, Serialize)]
pub struct Choice {
    pub index: u32,
    pub message: AssistantMessage,
    pub finish_reason: &'static str,
}

/// Non-streaming chat completion response
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletion {
    pub id: String,
    pub object: &'static str,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Usage,
}

impl ChatCompletion {
    /// Build a complete response around generated content
    pub fn new(content: String, model: String, prompt_chars: usize, created: i64) -> Self {
        let completion_chars = content.chars().count();
        Self {
            id: format!("chatcmpl-{}", uuid::Uuid::new_v4().simple()),
            object: OBJECT_CHAT_COMPLETION,
            created,
            model,
            choices: vec![Choice {
                index: 0,
                message: AssistantMessage {
                    role: "assistant",
                    content,
                },
                finish_reason: "stop",
            }],
            usage: Usage::estimate(prompt_chars, completion_chars),
        }
    }
}

/// Delta payload inside a streaming chunk
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChunkDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// One choice inside a streaming chunk
#[derive(Debug, Clone, Serialize)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: ChunkDelta,
    pub finish_reason: Option<&'static str>,
}

/// Streaming chat completion chunk
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: &'static str,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
}

impl ChatCompletionChunk {
    fn with_choice(id: &str, model: &str, created: i64, choice: ChunkChoice) -> Self {
        Self {
            id: id.to_string(),
            object: OBJECT_CHAT_COMPLETION_CHUNK,
            created,
            model: model.to_string(),
            choices: vec![choice],
        }
    }

    /// Initial chunk announcing the assistant role
    pub fn initial(id: &str, model: &str, created: i64) -> Self {
        Self::with_choice(
            id,
            model,
            created,
            ChunkChoice {
                index: 0,
                delta: ChunkDelta {
                    role: Some("assistant"),
                    content: None,
                },
                finish_reason: None,
            },
        )
    }

    /// Content delta chunk
    pub fn content(id: &str, model: &str, created: i64, text: &str) -> Self {
        Self::with_choice(
            id,
            model,
            created,
            ChunkChoice {
                index: 0,
                delta: ChunkDelta {
                    role: None,
                    content: Some(text.to_string()),
                },
                finish_reason: None,
            },
        )
    }

    /// Final chunk carrying the finish reason
    pub fn finish(id: &str, model: &str, created: i64) -> Self {
        Self::with_choice(
            id,
            model,
            created,
            ChunkChoice {
                index: 0,
                delta: ChunkDelta::default(),
                finish_reason: Some("stop"),
            },
        )
    }
}
