//! Completion orchestration: retry loop, backoff, model fallback, streaming
//!
//! Each request runs the same attempt machine: obtain a provider from the
//! selector, invoke its completion with a bounded timeout, and on failure
//! mark the provider failed and retry with exponential backoff until the
//! attempt cap. A requested model that the availability cache knows to be
//! disabled is substituted before the first attempt; a requested model that
//! exhausts its attempts is restarted once against a substitute.
//!
//! The availability cache's background refresh drives the same machinery
//! through [`Orchestrator::probe`], so probe failures share health state
//! with real traffic.

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult, ProviderError};
use crate::metrics::Metrics;
use crate::providers::{Message, ModelCatalog, ModelState, Provider, ProviderSelector};
use futures::StreamExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Backoff exponent cap: keeps `2^attempt` sleeps bounded even when the
/// attempt cap is the provider count of a large configuration
const MAX_BACKOFF_EXPONENT: usize = 6;

/// Buffered increments between producer and consumer; small enough that a
/// stalled client applies backpressure to the upstream read quickly
const INCREMENT_BUFFER: usize = 32;

/// Sleep duration after a failed attempt (attempt indices 0, 1, 2, ...)
fn backoff_after(attempt: usize) -> Duration {
    Duration::from_secs(1u64 << attempt.min(MAX_BACKOFF_EXPONENT))
}

/// One unit of streamed output delivered to a consumer
///
/// A stream is zero or more `Delta` items followed by exactly one terminal
/// marker: `Done` on clean completion, `Failed` when attempts were exhausted
/// after output had already been flushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Increment {
    Delta(String),
    Done,
    Failed(String),
}

/// A fully materialized completion
#[derive(Debug, Clone)]
pub struct Completion {
    /// The model that actually served the request (may be a substitute)
    pub model: String,
    pub content: String,
}

/// An in-flight streaming completion
pub struct StreamingCompletion {
    /// The model that is serving the stream (may be a substitute)
    pub model: String,
    pub increments: ReceiverStream<Increment>,
}

/// Drives provider attempts for completions and availability probes
#[derive(Clone)]
pub struct Orchestrator {
    selector: Arc<ProviderSelector>,
    catalog: Arc<ModelCatalog>,
    metrics: Metrics,
    default_model: Option<String>,
    max_attempts: usize,
    request_timeout: Duration,
    probe_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        selector: Arc<ProviderSelector>,
        catalog: Arc<ModelCatalog>,
        metrics: Metrics,
        gateway: &GatewayConfig,
    ) -> Self {
        Self {
            selector,
            catalog,
            metrics,
            default_model: gateway.default_model().map(|m| m.to_string()),
            max_attempts: gateway.max_attempts(),
            request_timeout: gateway.request_timeout(),
            probe_timeout: gateway.probe_timeout(),
        }
    }

    pub fn selector(&self) -> &Arc<ProviderSelector> {
        &self.selector
    }

    pub fn catalog(&self) -> &Arc<ModelCatalog> {
        &self.catalog
    }

    /// Attempt cap for fallback- and probe-driven retries
    fn provider_cap(&self) -> usize {
        self.selector.provider_count()
    }

    /// Run a non-streaming completion
    ///
    /// `requested` of `None` falls back to the configured default model,
    /// then to the first non-disabled catalog entry.
    pub async fn complete(
        &self,
        requested: Option<&str>,
        messages: &[Message],
    ) -> GatewayResult<Completion> {
        let (model, substituted) = self.resolve_model(requested).await?;
        let cap = if substituted {
            self.provider_cap()
        } else {
            self.max_attempts
        };

        match self
            .run_attempts(&model, messages, self.request_timeout, cap)
            .await
        {
            Ok(content) => Ok(Completion { model, content }),
            Err(GatewayError::Upstream(_)) if !substituted => {
                // The requested model exhausted its attempts: restart the
                // machine once against a substitute from the cache.
                let Some(substitute) = self.catalog.lookup_fallback(&model).await else {
                    return Err(GatewayError::NoActiveModels);
                };
                self.metrics.record_fallback();
                tracing::info!(
                    from = %model,
                    to = %substitute,
                    "restarting exhausted completion against fallback model"
                );
                let content = self
                    .run_attempts(&substitute, messages, self.request_timeout, self.provider_cap())
                    .await?;
                Ok(Completion {
                    model: substitute,
                    content,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Start a streaming completion
    ///
    /// Model substitution happens here, before the stream opens, so the
    /// returned `model` is the one every increment belongs to. The producer
    /// task retries failed attempts only while nothing has been flushed;
    /// once output is flushed, a failure surfaces as an in-band
    /// [`Increment::Failed`] rather than a new attempt under the same
    /// envelope. Dropping the consumer stops production; the in-flight
    /// provider call is discarded, not cancelled.
    pub async fn complete_stream(
        &self,
        requested: Option<&str>,
        messages: Vec<Message>,
    ) -> GatewayResult<StreamingCompletion> {
        let (model, substituted) = self.resolve_model(requested).await?;
        let cap = if substituted {
            self.provider_cap()
        } else {
            self.max_attempts
        };

        let (tx, rx) = mpsc::channel(INCREMENT_BUFFER);
        let orchestrator = self.clone();
        let serving_model = model.clone();
        let timeout = self.request_timeout;

        tokio::spawn(async move {
            orchestrator
                .produce_increments(tx, serving_model, messages, timeout, cap)
                .await;
        });

        Ok(StreamingCompletion {
            model,
            increments: ReceiverStream::new(rx),
        })
    }

    /// Probe one model with a minimal single-turn request
    ///
    /// Shares the attempt machine (and therefore the health registry) with
    /// real traffic, but with the short probe timeout and the provider-count
    /// attempt cap.
    pub async fn probe(&self, model: &str) -> (bool, Option<Duration>) {
        let messages = [Message::user("Hello")];
        let started = Instant::now();
        match self
            .run_attempts(model, &messages, self.probe_timeout, self.provider_cap())
            .await
        {
            Ok(_) => {
                let elapsed = started.elapsed();
                self.metrics.record_probe(model, elapsed.as_secs_f64());
                (true, Some(elapsed))
            }
            Err(e) => {
                tracing::warn!(model, error = %e, "availability probe failed");
                (false, None)
            }
        }
    }

    /// Re-state every catalog entry by probing each model in turn
    ///
    /// Probes run sequentially to avoid hammering providers.
    pub async fn refresh_all(&self) {
        self.catalog.begin_refresh().await;
        for model in self.catalog.model_names().await {
            let (active, latency) = self.probe(&model).await;
            self.catalog.record(&model, active, latency).await;
        }
        tracing::info!("availability refresh cycle complete");
    }

    /// Spawn the perpetual refresh task
    ///
    /// The first tick fires immediately (startup refresh); subsequent ticks
    /// follow the configured interval. Ticks are serialized: a cycle that
    /// outlives the interval delays the next tick instead of overlapping it.
    /// Abort the returned handle on shutdown.
    pub fn spawn_refresh(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let orchestrator = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                orchestrator.refresh_all().await;
            }
        })
    }

    /// Decide which model will serve a request
    ///
    /// Returns the model name and whether it is a substitute for the
    /// requested one. A model the cache knows to be disabled is substituted
    /// immediately; `checking` is not treated as disabled for the requested
    /// model itself, only for fallback candidates.
    async fn resolve_model(&self, requested: Option<&str>) -> GatewayResult<(String, bool)> {
        let requested = requested.or(self.default_model.as_deref());

        if let Some(model) = requested {
            if self.catalog.state_of(model).await != Some(ModelState::Disabled) {
                return Ok((model.to_string(), false));
            }
            let Some(substitute) = self.catalog.lookup_fallback(model).await else {
                tracing::error!(model, "requested model disabled and no fallback available");
                return Err(GatewayError::NoActiveModels);
            };
            self.metrics.record_fallback();
            tracing::info!(requested = %model, substitute = %substitute, "substituting disabled model");
            return Ok((substitute, true));
        }

        // No requested model and no configured default: first model the
        // cache does not know to be dead.
        self.catalog
            .snapshot()
            .await
            .into_iter()
            .find(|e| e.state != ModelState::Disabled)
            .map(|e| (e.name, false))
            .ok_or(GatewayError::NoActiveModels)
    }

    /// The attempt machine: select, invoke, mark failures, back off
    async fn run_attempts(
        &self,
        model: &str,
        messages: &[Message],
        timeout: Duration,
        max_attempts: usize,
    ) -> GatewayResult<String> {
        let mut last_error: Option<ProviderError> = None;

        for attempt in 0..max_attempts {
            let provider = self.selector.next(Instant::now())?;

            tracing::debug!(
                provider = %provider.name(),
                model,
                attempt,
                max_attempts,
                "attempting completion"
            );

            match self
                .attempt_once(provider.as_ref(), model, messages, timeout)
                .await
            {
                Ok(content) => {
                    tracing::info!(
                        provider = %provider.name(),
                        model,
                        attempt,
                        response_length = content.len(),
                        "completion attempt succeeded"
                    );
                    return Ok(content);
                }
                Err(e) => {
                    self.register_failure(provider.name(), &e);
                    last_error = Some(e);
                    if attempt + 1 < max_attempts {
                        tokio::time::sleep(backoff_after(attempt)).await;
                    }
                }
            }
        }

        tracing::error!(model, max_attempts, "all completion attempts exhausted");
        Err(match last_error {
            Some(e) => GatewayError::Upstream(e),
            None => GatewayError::Internal("attempt loop ran zero attempts".to_string()),
        })
    }

    /// One provider invocation, fully collected, bounded by `timeout`
    async fn attempt_once(
        &self,
        provider: &dyn Provider,
        model: &str,
        messages: &[Message],
        timeout: Duration,
    ) -> Result<String, ProviderError> {
        let mut stream = provider.complete(model, messages, timeout).await?;

        let collected = tokio::time::timeout(timeout, async {
            let mut content = String::new();
            while let Some(item) = stream.next().await {
                match item {
                    Ok(delta) => content.push_str(&delta),
                    // Discard the partial response; the caller retries
                    Err(e) => return Err(e),
                }
            }
            Ok(content)
        })
        .await;

        match collected {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                timeout_seconds: timeout.as_secs(),
            }),
        }
    }

    /// Producer side of a streaming completion
    async fn produce_increments(
        &self,
        tx: mpsc::Sender<Increment>,
        model: String,
        messages: Vec<Message>,
        timeout: Duration,
        max_attempts: usize,
    ) {
        let mut last_error: Option<String> = None;
        let mut attempt = 0;

        while attempt < max_attempts {
            let provider = match self.selector.next(Instant::now()) {
                Ok(p) => p,
                Err(e) => {
                    // Every provider cooling down: nothing left to try
                    let _ = tx.send(Increment::Failed(e.to_string())).await;
                    return;
                }
            };

            match provider.complete(&model, &messages, timeout).await {
                Ok(mut stream) => {
                    let mut flushed = false;
                    loop {
                        match stream.next().await {
                            Some(Ok(delta)) => {
                                flushed = true;
                                if tx.send(Increment::Delta(delta)).await.is_err() {
                                    // Consumer disconnected: stop producing.
                                    // The provider call is dropped here, not
                                    // cancelled upstream - accepted leak.
                                    tracing::debug!(
                                        provider = %provider.name(),
                                        model = %model,
                                        "stream consumer went away"
                                    );
                                    return;
                                }
                            }
                            Some(Err(e)) => {
                                self.register_failure(provider.name(), &e);
                                if flushed {
                                    // Output already reached the client under
                                    // this envelope; fail in-band, never
                                    // unwind past flushed increments.
                                    let _ = tx.send(Increment::Failed(e.to_string())).await;
                                    return;
                                }
                                last_error = Some(e.to_string());
                                break;
                            }
                            None => {
                                let _ = tx.send(Increment::Done).await;
                                return;
                            }
                        }
                    }
                }
                Err(e) => {
                    self.register_failure(provider.name(), &e);
                    last_error = Some(e.to_string());
                }
            }

            attempt += 1;
            if attempt < max_attempts {
                tokio::time::sleep(backoff_after(attempt - 1)).await;
            }
        }

        let reason = last_error.unwrap_or_else(|| "all completion attempts exhausted".to_string());
        let _ = tx.send(Increment::Failed(reason)).await;
    }

    fn register_failure(&self, provider: &str, error: &ProviderError) {
        tracing::warn!(provider, error = %error, "provider attempt failed");
        self.selector.registry().mark_failed(provider);
        self.metrics.record_provider_failure(provider);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{CompletionStream, HealthRegistry, Role};
    use async_trait::async_trait;
    use futures::stream;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted provider: pops one outcome per call, repeats the last one
    struct ScriptedProvider {
        name: String,
        models: Vec<String>,
        script: Mutex<Vec<Result<String, ProviderError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(name: &str, script: Vec<Result<String, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                models: vec!["test-model".to_string()],
                script: Mutex::new(script),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn models(&self) -> &[String] {
            &self.models
        }

        async fn complete(
            &self,
            _model: &str,
            _messages: &[Message],
            _timeout: Duration,
        ) -> Result<CompletionStream, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().expect("script lock");
            let outcome = if script.len() > 1 {
                script.remove(0)
            } else {
                script
                    .first()
                    .cloned()
                    .unwrap_or_else(|| Err(ProviderError::Connect("script empty".to_string())))
            };
            match outcome {
                Ok(text) => Ok(stream::iter(vec![Ok(text)]).boxed()),
                Err(e) => Err(e),
            }
        }
    }

    fn transient() -> ProviderError {
        ProviderError::Connect("connection refused".to_string())
    }

    fn orchestrator_with(
        providers: Vec<Arc<ScriptedProvider>>,
        models: Vec<&str>,
    ) -> Orchestrator {
        let registry = Arc::new(HealthRegistry::new(Duration::from_secs(300)));
        let dyn_providers: Vec<Arc<dyn Provider>> = providers
            .into_iter()
            .map(|p| p as Arc<dyn Provider>)
            .collect();
        let selector = Arc::new(ProviderSelector::new(dyn_providers, registry));
        let catalog = Arc::new(ModelCatalog::with_models(
            models.into_iter().map(|m| m.to_string()).collect(),
        ));
        Orchestrator::new(
            selector,
            catalog,
            Metrics::new().expect("metrics"),
            &GatewayConfig::default(),
        )
    }

    fn hello() -> Vec<Message> {
        vec![Message::new(Role::User, "Hello")]
    }

    #[tokio::test(start_paused = true)]
    async fn single_failure_fails_over_and_records_one_failure() {
        let alpha = ScriptedProvider::new("alpha", vec![Err(transient())]);
        let beta = ScriptedProvider::new("beta", vec![Ok("recovered".to_string())]);
        let orchestrator =
            orchestrator_with(vec![alpha.clone(), beta], vec!["test-model"]);
        orchestrator.catalog().record("test-model", true, None).await;

        let completion = orchestrator
            .complete(Some("test-model"), &hello())
            .await
            .expect("should succeed on retry");

        assert_eq!(completion.content, "recovered");
        assert_eq!(completion.model, "test-model");
        assert_eq!(alpha.calls(), 1);
        assert_eq!(orchestrator.selector().registry().failure_count(), 1);
        assert!(orchestrator
            .selector()
            .registry()
            .last_failure("alpha")
            .is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_short_circuits_remaining_attempts() {
        let provider = ScriptedProvider::new("alpha", vec![Err(transient())]);
        let orchestrator = orchestrator_with(vec![provider.clone()], vec!["test-model"]);
        orchestrator.catalog().record("test-model", true, None).await;

        // The first failure puts alpha into cooldown, so later attempts stop
        // at the selector; the provider itself is only ever called once.
        let err = orchestrator
            .complete(Some("test-model"), &hello())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::AllProvidersUnavailable));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ordinary_requests_never_exceed_three_attempts() {
        // Five failing providers, but the non-fallback path stops after the
        // 3-attempt cap; with no fallback model the request then dies.
        let providers: Vec<Arc<ScriptedProvider>> = ["p1", "p2", "p3", "p4", "p5"]
            .iter()
            .map(|n| ScriptedProvider::new(n, vec![Err(transient())]))
            .collect();
        let orchestrator = orchestrator_with(providers.clone(), vec!["gpt-4"]);
        orchestrator.catalog().record("gpt-4", true, None).await;

        let err = orchestrator
            .complete(Some("gpt-4"), &hello())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NoActiveModels));

        let total_calls: usize = providers.iter().map(|p| p.calls()).sum();
        assert_eq!(total_calls, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn success_path_never_writes_to_registry() {
        let provider = ScriptedProvider::new("alpha", vec![Ok("fine".to_string())]);
        let orchestrator = orchestrator_with(vec![provider], vec!["test-model"]);
        orchestrator.catalog().record("test-model", true, None).await;

        for _ in 0..3 {
            orchestrator
                .complete(Some("test-model"), &hello())
                .await
                .expect("healthy providers should succeed");
        }

        assert_eq!(orchestrator.selector().registry().failure_count(), 0);
        assert_eq!(
            orchestrator.selector().registry().sticky().as_deref(),
            Some("alpha")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_model_is_substituted_before_attempting() {
        let provider = ScriptedProvider::new("alpha", vec![Ok("served".to_string())]);
        let orchestrator =
            orchestrator_with(vec![provider], vec!["gpt-4", "gpt-4o"]);
        orchestrator.catalog().record("gpt-4", false, None).await;
        orchestrator.catalog().record("gpt-4o", true, None).await;

        let completion = orchestrator
            .complete(Some("gpt-4"), &hello())
            .await
            .expect("fallback should serve");

        assert_eq!(completion.model, "gpt-4o");
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_model_without_fallback_is_no_active_models() {
        let provider = ScriptedProvider::new("alpha", vec![Ok("unused".to_string())]);
        let orchestrator = orchestrator_with(vec![provider.clone()], vec!["gpt-4"]);
        orchestrator.catalog().record("gpt-4", false, None).await;

        let err = orchestrator
            .complete(Some("gpt-4"), &hello())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NoActiveModels));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_serves_original_model_from_next_provider() {
        let alpha = ScriptedProvider::new("alpha", vec![Err(transient())]);
        let beta = ScriptedProvider::new("beta", vec![Ok("from beta".to_string())]);
        let orchestrator =
            orchestrator_with(vec![alpha, beta], vec!["gpt-4", "gpt-4o"]);
        orchestrator.catalog().record("gpt-4", true, None).await;
        orchestrator.catalog().record("gpt-4o", true, None).await;

        // alpha fails the first attempt and cools down; beta serves the
        // second attempt of the original model, so no fallback is needed.
        let completion = orchestrator
            .complete(Some("gpt-4"), &hello())
            .await
            .expect("beta should serve");
        assert_eq!(completion.model, "gpt-4");
        assert_eq!(completion.content, "from beta");
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_attempt_cap_restarts_against_fallback_model() {
        // Three providers burn through the 3-attempt cap; the fourth is
        // still eligible, so the fallback restart (provider-count cap)
        // reaches it with the substitute model.
        let p1 = ScriptedProvider::new("p1", vec![Err(transient())]);
        let p2 = ScriptedProvider::new("p2", vec![Err(transient())]);
        let p3 = ScriptedProvider::new("p3", vec![Err(transient())]);
        let p4 = ScriptedProvider::new("p4", vec![Ok("rescued".to_string())]);
        let orchestrator =
            orchestrator_with(vec![p1, p2, p3, p4.clone()], vec!["gpt-4", "gpt-4o"]);
        orchestrator.catalog().record("gpt-4", true, None).await;
        orchestrator.catalog().record("gpt-4o", true, None).await;

        let completion = orchestrator
            .complete(Some("gpt-4"), &hello())
            .await
            .expect("fallback restart should serve");

        assert_eq!(completion.model, "gpt-4o");
        assert_eq!(completion.content, "rescued");
        assert_eq!(p4.calls(), 1);
        assert_eq!(orchestrator.selector().registry().failure_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn no_requested_model_uses_configured_default_or_first_entry() {
        let provider = ScriptedProvider::new("alpha", vec![Ok("default served".to_string())]);
        let orchestrator = orchestrator_with(vec![provider], vec!["gpt-4", "gpt-4o"]);
        orchestrator.catalog().record("gpt-4", true, None).await;

        let completion = orchestrator
            .complete(None, &hello())
            .await
            .expect("should pick a model");
        assert_eq!(completion.model, "gpt-4");
    }

    #[tokio::test(start_paused = true)]
    async fn streaming_delivers_deltas_then_single_done() {
        let provider = ScriptedProvider::new("alpha", vec![Ok("streamed".to_string())]);
        let orchestrator = orchestrator_with(vec![provider], vec!["test-model"]);
        orchestrator.catalog().record("test-model", true, None).await;

        let streaming = orchestrator
            .complete_stream(Some("test-model"), hello())
            .await
            .expect("stream should open");
        assert_eq!(streaming.model, "test-model");

        let items: Vec<Increment> = streaming.increments.collect().await;
        assert_eq!(
            items,
            vec![
                Increment::Delta("streamed".to_string()),
                Increment::Done
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn streaming_failure_yields_in_band_error_marker() {
        let provider = ScriptedProvider::new("alpha", vec![Err(transient())]);
        let orchestrator = orchestrator_with(vec![provider], vec!["test-model"]);
        orchestrator.catalog().record("test-model", true, None).await;

        let streaming = orchestrator
            .complete_stream(Some("test-model"), hello())
            .await
            .expect("stream should open");
        let items: Vec<Increment> = streaming.increments.collect().await;

        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Increment::Failed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn probe_shares_failure_state_with_real_traffic() {
        let provider = ScriptedProvider::new("alpha", vec![Err(transient())]);
        let orchestrator = orchestrator_with(vec![provider], vec!["test-model"]);

        let (active, elapsed) = orchestrator.probe("test-model").await;
        assert!(!active);
        assert!(elapsed.is_none());
        assert!(orchestrator
            .selector()
            .registry()
            .last_failure("alpha")
            .is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_all_leaves_no_entry_checking() {
        let alpha = ScriptedProvider::new("alpha", vec![Ok("pong".to_string())]);
        let orchestrator = orchestrator_with(vec![alpha], vec!["gpt-4", "gpt-4o"]);

        orchestrator.refresh_all().await;

        for entry in orchestrator.catalog().snapshot().await {
            assert_ne!(entry.state, ModelState::Checking);
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        assert_eq!(backoff_after(0), Duration::from_secs(1));
        assert_eq!(backoff_after(1), Duration::from_secs(2));
        assert_eq!(backoff_after(2), Duration::from_secs(4));
        assert_eq!(backoff_after(20), Duration::from_secs(64));
    }
}
