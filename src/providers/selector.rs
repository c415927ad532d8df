//! Provider selection logic
//!
//! Picks the next provider to try: the sticky (most recently selected)
//! provider while it remains eligible, otherwise the first eligible provider
//! in configured order. Selection is deterministic - no weighting, no
//! randomization - so failover behavior is predictable from the config file.

use crate::error::GatewayError;
use crate::providers::registry::HealthRegistry;
use crate::providers::Provider;
use std::sync::Arc;
use std::time::Instant;

/// Selects a provider from the configured list, preferring the sticky one
///
/// The sticky provider and the failure map live in the shared
/// [`HealthRegistry`]; `next` performs its re-validate-then-pick sequence
/// under the registry's single lock so concurrent requests cannot observe a
/// half-updated sticky selection.
pub struct ProviderSelector {
    providers: Vec<Arc<dyn Provider>>,
    registry: Arc<HealthRegistry>,
}

impl ProviderSelector {
    /// Create a selector over `providers` in their declared order
    pub fn new(providers: Vec<Arc<dyn Provider>>, registry: Arc<HealthRegistry>) -> Self {
        Self {
            providers,
            registry,
        }
    }

    /// Get a reference to the shared health registry
    pub fn registry(&self) -> &Arc<HealthRegistry> {
        &self.registry
    }

    /// Number of configured providers
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// The configured providers in declared order
    pub fn providers(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }

    /// Pick the provider for the next attempt
    ///
    /// Returns the sticky provider unchanged if it is still eligible at
    /// `now`. Otherwise scans the configured list in declared order and
    /// returns the first eligible provider, making it the new sticky
    /// selection. An ineligible sticky is cleared, never returned stale.
    ///
    /// # Errors
    /// [`GatewayError::AllProvidersUnavailable`] when every configured
    /// provider is inside its cooldown window.
    pub fn next(&self, now: Instant) -> Result<Arc<dyn Provider>, GatewayError> {
        let retry_delay = self.registry.retry_delay();
        let mut state = self.registry.lock();

        if let Some(sticky) = state.sticky.clone() {
            if HealthRegistry::eligible_in(&state, &sticky, now, retry_delay) {
                if let Some(provider) = self.find(&sticky) {
                    tracing::debug!(provider = %sticky, "reusing sticky provider");
                    return Ok(provider);
                }
            }
            tracing::debug!(provider = %sticky, "sticky provider no longer eligible");
            state.sticky = None;
        }

        for provider in &self.providers {
            if HealthRegistry::eligible_in(&state, provider.name(), now, retry_delay) {
                state.sticky = Some(provider.name().to_string());
                tracing::info!(provider = %provider.name(), "selected provider");
                return Ok(provider.clone());
            }
        }

        tracing::error!(
            provider_count = self.providers.len(),
            cooldown_secs = retry_delay.as_secs(),
            "every configured provider is cooling down"
        );
        Err(GatewayError::AllProvidersUnavailable)
    }

    fn find(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.iter().find(|p| p.name() == name).cloned()
    }
}
