//! OpenAI-compatible API handlers
//!
//! - `POST /chat/completions` - chat completions, streaming and not
//! - Shared types for the chat-completions wire format

pub mod completions;
pub mod streaming;
pub mod types;
