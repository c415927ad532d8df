//! HTTP request handlers for the Hydragate API

use crate::config::Config;
use crate::error::{GatewayError, GatewayResult};
use crate::metrics::Metrics;
use crate::orchestrator::Orchestrator;
use crate::providers::{HealthRegistry, HttpProvider, ModelCatalog, Provider, ProviderSelector};
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod anthropic;
pub mod extractor;
pub mod health;
pub mod metrics;
pub mod models;
pub mod openai;

/// Application state shared across all handlers
///
/// Owns the orchestration context (selector, registry, catalog) so nothing
/// lives in ambient globals; tests inject their own provider pool.
/// All fields are cheap to clone across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    orchestrator: Arc<Orchestrator>,
    metrics: Metrics,
}

impl AppState {
    /// Create state with HTTP providers built from the configuration
    pub fn new(config: Arc<Config>) -> GatewayResult<Self> {
        let providers: Vec<Arc<dyn Provider>> = config
            .providers
            .iter()
            .map(|p| HttpProvider::from_config(p).map(|p| Arc::new(p) as Arc<dyn Provider>))
            .collect::<Result<_, _>>()?;
        Self::with_providers(config, providers)
    }

    /// Create state with an explicit provider pool (tests)
    pub fn with_providers(
        config: Arc<Config>,
        providers: Vec<Arc<dyn Provider>>,
    ) -> GatewayResult<Self> {
        let metrics = Metrics::new()
            .map_err(|e| GatewayError::Internal(format!("metrics registration failed: {}", e)))?;
        let registry = Arc::new(HealthRegistry::new(config.gateway.retry_delay()));
        let selector = Arc::new(ProviderSelector::new(providers, registry));
        let catalog = Arc::new(ModelCatalog::from_providers(selector.providers()));
        let orchestrator = Arc::new(Orchestrator::new(
            selector,
            catalog,
            metrics.clone(),
            &config.gateway,
        ));

        Ok(Self {
            config,
            orchestrator,
            metrics,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// Build the full gateway router
///
/// Both chat surfaces sit behind permissive CORS plus request-id and trace
/// layers. The unversioned paths match the original deployment; the /v1
/// aliases are what most SDK clients default to.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/chat/completions", post(openai::completions::handler))
        .route("/v1/chat/completions", post(openai::completions::handler))
        .route("/v1/messages", post(anthropic::messages::handler))
        .route("/v1/direct", post(anthropic::messages::direct_handler))
        .route("/models", get(models::handler))
        .route("/v1/models", get(models::handler))
        .route("/health", get(health::handler))
        .route("/metrics", get(metrics::handler))
        .layer(axum::middleware::from_fn(
            crate::middleware::request_id_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
