//! OpenAI-compatible HTTP provider
//!
//! Talks to one upstream endpoint speaking the OpenAI chat-completions
//! dialect. Completions are always requested with `stream: true`; the SSE
//! body is decoded into plain text increments, and non-streaming callers
//! collect the stream themselves.

use crate::config::ProviderConfig;
use crate::error::{GatewayError, ProviderError};
use crate::providers::{CompletionStream, Message, Provider};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upstream request body (OpenAI chat-completions dialect)
#[derive(Serialize)]
struct UpstreamRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

/// One SSE chunk from the upstream: only the delta text matters here
#[derive(Deserialize)]
struct UpstreamChunk {
    #[serde(default)]
    choices: Vec<UpstreamChoice>,
}

#[derive(Deserialize)]
struct UpstreamChoice {
    #[serde(default)]
    delta: UpstreamDelta,
}

#[derive(Deserialize, Default)]
struct UpstreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// A configured upstream provider reachable over HTTP
pub struct HttpProvider {
    name: String,
    base_url: String,
    api_key: Option<String>,
    models: Vec<String>,
    client: reqwest::Client,
}

impl HttpProvider {
    /// Build a provider from its config entry, resolving credentials from
    /// the environment at startup so a missing key fails fast
    pub fn from_config(config: &ProviderConfig) -> Result<Self, GatewayError> {
        let api_key = match config.api_key_env() {
            Some(var) => {
                let key = std::env::var(var).map_err(|_| {
                    GatewayError::Config(format!(
                        "provider '{}': environment variable {} is not set",
                        config.name(),
                        var
                    ))
                })?;
                Some(key)
            }
            None => None,
        };

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| GatewayError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            name: config.name().to_string(),
            base_url: config.base_url().trim_end_matches('/').to_string(),
            api_key,
            models: config.models().to_vec(),
            client,
        })
    }
}

#[async_trait]
impl Provider for HttpProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn models(&self) -> &[String] {
        &self.models
    }

    async fn complete(
        &self,
        model: &str,
        messages: &[Message],
        timeout: Duration,
    ) -> Result<CompletionStream, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = UpstreamRequest {
            model,
            messages,
            stream: true,
        };

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        tracing::debug!(
            provider = %self.name,
            model,
            messages = messages.len(),
            timeout_seconds = timeout.as_secs(),
            "starting upstream completion"
        );

        // The timeout bounds time-to-response-headers; the SSE body itself
        // may legitimately outlive it for long generations.
        let response = tokio::time::timeout(timeout, request.send())
            .await
            .map_err(|_| ProviderError::Timeout {
                timeout_seconds: timeout.as_secs(),
            })?
            .map_err(|e| ProviderError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let detail = detail.chars().take(300).collect::<String>();
            tracing::warn!(
                provider = %self.name,
                model,
                status = status.as_u16(),
                "upstream rejected completion"
            );
            return Err(ProviderError::Http {
                status: status.as_u16(),
                detail,
            });
        }

        let provider_name = self.name.clone();

        let stream = async_stream::stream! {
            let events = response.bytes_stream().eventsource();
            tokio::pin!(events);
            let mut bytes_received = 0usize;
            while let Some(event) = events.next().await {
                match event {
                    Ok(event) => {
                        if event.data.trim() == "[DONE]" {
                            break;
                        }
                        let chunk: UpstreamChunk = match serde_json::from_str(&event.data) {
                            Ok(chunk) => chunk,
                            Err(e) => {
                                tracing::debug!(
                                    provider = %provider_name,
                                    error = %e,
                                    "skipping unparseable upstream chunk"
                                );
                                continue;
                            }
                        };
                        if let Some(text) = chunk
                            .choices
                            .into_iter()
                            .next()
                            .and_then(|c| c.delta.content)
                        {
                            if !text.is_empty() {
                                bytes_received += text.len();
                                yield Ok(text);
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(
                            provider = %provider_name,
                            bytes_received,
                            error = %e,
                            "upstream stream broke"
                        );
                        yield Err(ProviderError::Stream {
                            bytes_received,
                            detail: e.to_string(),
                        });
                        break;
                    }
                }
            }
        };

        Ok(stream.boxed())
    }
}
