//! Upstream providers and the selection machinery in front of them
//!
//! A [`Provider`] is an upstream backend with a name, an advertised model
//! list, and a completion capability. The registry tracks per-provider
//! failure times, the selector picks the next provider to try (sticky-first,
//! declared order), and the catalog caches which models are currently
//! reachable.

pub mod catalog;
pub mod http;
pub mod registry;
pub mod selector;

pub use catalog::{ModelCatalog, ModelEntry, ModelState};
pub use http::HttpProvider;
pub use registry::HealthRegistry;
pub use selector::ProviderSelector;

use crate::error::ProviderError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Convenience constructor for user messages (probes, tests)
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Content length in characters (Unicode-aware), used for token estimates
    pub fn content_length(&self) -> usize {
        self.content.chars().count()
    }
}

/// Incremental completion output: one item per text increment
pub type CompletionStream = BoxStream<'static, Result<String, ProviderError>>;

/// An upstream language-model backend
///
/// Identity is the provider's name, unique within the configured list.
/// `complete` always yields a stream of text increments; non-streaming
/// callers collect it. A failed call reports a [`ProviderError`] and the
/// orchestrator decides whether to retry elsewhere.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Unique provider name
    fn name(&self) -> &str;

    /// Model names this provider advertises
    fn models(&self) -> &[String];

    /// Run a completion against `model`, bounded by `timeout`
    async fn complete(
        &self,
        model: &str,
        messages: &[Message],
        timeout: Duration,
    ) -> Result<CompletionStream, ProviderError>;
}
