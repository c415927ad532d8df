//! Anthropic-compatible API handlers
//!
//! - `POST /v1/messages` - always-streaming messages endpoint
//! - `POST /v1/direct` - synchronous variant returning the full text

pub mod messages;
pub mod types;
