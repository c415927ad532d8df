//! Provider health registry
//!
//! Tracks, per provider, the time of its most recent failure, plus the
//! sticky provider preferred by the selector. Both live behind a single
//! mutex so that concurrent failure reports and selections cannot tear the
//! read-modify-write of either field.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Shared mutable selection state: failure stamps and the sticky provider.
///
/// Crate-visible so the selector can perform its re-validate-then-pick
/// sequence under the same lock acquisition.
#[derive(Debug, Default)]
pub(crate) struct RegistryState {
    pub(crate) last_failure: HashMap<String, Instant>,
    pub(crate) sticky: Option<String>,
}

/// Health registry for configured providers
///
/// A provider that failed within `retry_delay` is ineligible; one that never
/// failed, or whose last failure is older than the window, is eligible. The
/// cooldown is one fixed duration applied uniformly to all providers.
#[derive(Debug)]
pub struct HealthRegistry {
    state: Mutex<RegistryState>,
    retry_delay: Duration,
}

impl HealthRegistry {
    /// Create a registry with the given uniform cooldown window
    pub fn new(retry_delay: Duration) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            retry_delay,
        }
    }

    /// The uniform cooldown window
    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, RegistryState> {
        // A panic while holding this lock leaves consistent data (both fields
        // are updated before any fallible call), so recover rather than
        // propagate poisoning: mark_failed must never fail.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a failure for `provider` at the current time
    ///
    /// Clears the sticky selection if the failed provider was sticky.
    pub fn mark_failed(&self, provider: &str) {
        self.mark_failed_at(provider, Instant::now());
    }

    /// Record a failure for `provider` at an explicit time (tests)
    pub fn mark_failed_at(&self, provider: &str, now: Instant) {
        let mut state = self.lock();
        state.last_failure.insert(provider.to_string(), now);
        if state.sticky.as_deref() == Some(provider) {
            tracing::debug!(provider, "clearing sticky selection after failure");
            state.sticky = None;
        }
        tracing::warn!(provider, cooldown_secs = self.retry_delay.as_secs(), "provider marked failed");
    }

    /// Is `provider` outside its cooldown window at `now`?
    pub fn is_eligible(&self, provider: &str, now: Instant) -> bool {
        let state = self.lock();
        Self::eligible_in(&state, provider, now, self.retry_delay)
    }

    /// Eligibility check against an already-locked state
    pub(crate) fn eligible_in(
        state: &RegistryState,
        provider: &str,
        now: Instant,
        retry_delay: Duration,
    ) -> bool {
        match state.last_failure.get(provider) {
            Some(failed_at) => now.duration_since(*failed_at) > retry_delay,
            None => true,
        }
    }

    /// The current sticky provider, if any
    pub fn sticky(&self) -> Option<String> {
        self.lock().sticky.clone()
    }

    /// Most recent failure time recorded for `provider`
    pub fn last_failure(&self, provider: &str) -> Option<Instant> {
        self.lock().last_failure.get(provider).copied()
    }

    /// Number of providers with a recorded failure
    pub fn failure_count(&self) -> usize {
        self.lock().last_failure.len()
    }
}
