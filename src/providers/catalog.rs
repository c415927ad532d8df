//! Model availability cache
//!
//! A periodically refreshed map from model name to availability state and
//! measured latency. Entries are created once at startup from the union of
//! every configured provider's advertised models and are never deleted,
//! only re-stated by the background refresh cycle. Request handling reads
//! the cache; the refresh task is the sole writer.

use crate::providers::Provider;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Availability state of one model
///
/// `Checking` is a transient state set at the start of a refresh cycle; a
/// model observed mid-transition is treated as unavailable for fallback
/// purposes, never as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelState {
    Checking,
    Enabled,
    Disabled,
}

/// One cache entry: model name, state, and last measured probe latency
#[derive(Debug, Clone)]
pub struct ModelEntry {
    pub name: String,
    pub state: ModelState,
    pub latency: Option<Duration>,
}

/// Read-mostly availability cache shared between request handlers and the
/// background refresh task
pub struct ModelCatalog {
    entries: RwLock<Vec<ModelEntry>>,
}

impl ModelCatalog {
    /// Build the catalog from the union of advertised models, first-seen
    /// order preserved (the fallback lookup walks this order)
    pub fn from_providers(providers: &[Arc<dyn Provider>]) -> Self {
        let mut names: Vec<String> = Vec::new();
        for provider in providers {
            for model in provider.models() {
                if !names.iter().any(|n| n == model) {
                    names.push(model.clone());
                }
            }
        }
        Self::with_models(names)
    }

    /// Build the catalog from an explicit model list (tests)
    pub fn with_models(names: Vec<String>) -> Self {
        let entries = names
            .into_iter()
            .map(|name| ModelEntry {
                name,
                state: ModelState::Checking,
                latency: None,
            })
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Names of all tracked models in cache order
    pub async fn model_names(&self) -> Vec<String> {
        self.entries
            .read()
            .await
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    /// A point-in-time copy of every entry
    pub async fn snapshot(&self) -> Vec<ModelEntry> {
        self.entries.read().await.clone()
    }

    /// State of one model, if tracked
    pub async fn state_of(&self, model: &str) -> Option<ModelState> {
        self.entries
            .read()
            .await
            .iter()
            .find(|e| e.name == model)
            .map(|e| e.state)
    }

    /// Is `model` currently enabled?
    pub async fn is_enabled(&self, model: &str) -> bool {
        self.state_of(model).await == Some(ModelState::Enabled)
    }

    /// First enabled model other than `excluding`, in cache order
    pub async fn lookup_fallback(&self, excluding: &str) -> Option<String> {
        self.entries
            .read()
            .await
            .iter()
            .find(|e| e.state == ModelState::Enabled && e.name != excluding)
            .map(|e| e.name.clone())
    }

    /// Mark every entry as `Checking` at the start of a refresh cycle
    pub async fn begin_refresh(&self) {
        let mut entries = self.entries.write().await;
        for entry in entries.iter_mut() {
            entry.state = ModelState::Checking;
        }
        tracing::debug!(models = entries.len(), "availability refresh started");
    }

    /// Write back one probe outcome
    pub async fn record(&self, model: &str, active: bool, latency: Option<Duration>) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.iter_mut().find(|e| e.name == model) {
            entry.state = if active {
                ModelState::Enabled
            } else {
                ModelState::Disabled
            };
            entry.latency = latency;
            tracing::info!(
                model,
                active,
                latency_ms = latency.map(|d| d.as_millis() as u64),
                "model availability recorded"
            );
        } else {
            tracing::warn!(model, "probe result for untracked model dropped");
        }
    }
}
