//! Prometheus metrics collection for Hydragate
//!
//! Tracks request counts by API surface, provider failures, model
//! fallbacks, and probe latency. Exposed via the `/metrics` endpoint in
//! Prometheus text format.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// API surface enum for type-safe metrics labels
///
/// Prevents cardinality explosion by restricting surface values to the two
/// supported dialects at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// OpenAI-style /chat/completions
    OpenAi,
    /// Anthropic-style /v1/messages and /v1/direct
    Anthropic,
}

impl Surface {
    /// Convert surface to Prometheus label string
    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::OpenAi => "openai",
            Surface::Anthropic => "anthropic",
        }
    }
}

/// Metrics collector for Hydragate
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    requests_total: IntCounterVec,
    provider_failures: IntCounterVec,
    fallbacks_total: IntCounter,
    probe_duration: HistogramVec,
}

impl Metrics {
    /// Create a new Metrics instance
    ///
    /// Registers all metrics with a new Prometheus registry.
    ///
    /// # Errors
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new(
                "hydragate_requests_total",
                "Total chat requests by API surface and delivery mode",
            ),
            &["surface", "mode"],
        )?;

        let provider_failures = IntCounterVec::new(
            Opts::new(
                "hydragate_provider_failures_total",
                "Total provider attempt failures by provider name",
            ),
            &["provider"],
        )?;

        let fallbacks_total = IntCounter::new(
            "hydragate_model_fallbacks_total",
            "Requests served by a substitute model after the requested one was unavailable or exhausted",
        )?;

        // Cardinality is bounded by the configured model catalog
        let probe_duration = HistogramVec::new(
            HistogramOpts::new(
                "hydragate_probe_duration_seconds",
                "Availability probe latency in seconds by model",
            )
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["model"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(provider_failures.clone()))?;
        registry.register(Box::new(fallbacks_total.clone()))?;
        registry.register(Box::new(probe_duration.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            provider_failures,
            fallbacks_total,
            probe_duration,
        })
    }

    /// Record one inbound chat request
    pub fn record_request(&self, surface: Surface, streaming: bool) {
        let mode = if streaming { "stream" } else { "batch" };
        self.requests_total
            .with_label_values(&[surface.as_str(), mode])
            .inc();
    }

    /// Record a failed provider attempt
    pub fn record_provider_failure(&self, provider: &str) {
        self.provider_failures.with_label_values(&[provider]).inc();
    }

    /// Record a request served by a substitute model
    pub fn record_fallback(&self) {
        self.fallbacks_total.inc();
    }

    /// Record one successful probe's latency
    pub fn record_probe(&self, model: &str, seconds: f64) {
        self.probe_duration
            .with_label_values(&[model])
            .observe(seconds);
    }

    /// Render all metrics in Prometheus text exposition format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| prometheus::Error::Msg(format!("non-utf8 metrics output: {}", e)))
    }
}
