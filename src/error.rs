//! Error types for Hydragate
//!
//! All gateway-level errors implement `IntoResponse` for Axum handlers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// A transient failure from a single provider attempt.
///
/// Every variant is retryable: the orchestrator catches these at the attempt
/// boundary, marks the provider failed in the health registry, and moves on
/// to the next attempt. They only surface to a client once all attempts are
/// exhausted, wrapped in [`GatewayError::Upstream`].
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("failed to reach provider: {0}")]
    Connect(String),

    #[error("provider returned HTTP {status}: {detail}")]
    Http { status: u16, detail: String },

    #[error("provider did not respond within {timeout_seconds} seconds")]
    Timeout { timeout_seconds: u64 },

    #[error("provider stream broke after {bytes_received} bytes: {detail}")]
    Stream {
        bytes_received: usize,
        detail: String,
    },

    #[error("missing credentials: environment variable {0} is not set")]
    MissingCredentials(String),
}

/// Main error type for the application
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("All providers are cooling down after recent failures")]
    AllProvidersUnavailable,

    #[error("No active models available to serve the request")]
    NoActiveModels,

    #[error("Upstream completion failed: {0}")]
    Upstream(#[from] ProviderError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            Self::AllProvidersUnavailable => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            Self::NoActiveModels => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            Self::Upstream(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_creates() {
        let err = GatewayError::Config("test error".to_string());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_validation_error_creates() {
        let err = GatewayError::Validation("invalid input".to_string());
        assert_eq!(err.to_string(), "Invalid request: invalid input");
    }

    #[test]
    fn test_provider_timeout_message_names_duration() {
        let err = ProviderError::Timeout { timeout_seconds: 30 };
        assert!(err.to_string().contains("30 seconds"));
    }

    #[test]
    fn test_validation_error_response_status() {
        let err = GatewayError::Validation("test".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_all_providers_unavailable_is_503() {
        let err = GatewayError::AllProvidersUnavailable;
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_no_active_models_is_503() {
        let err = GatewayError::NoActiveModels;
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_exhausted_upstream_is_502() {
        let err = GatewayError::Upstream(ProviderError::Connect("refused".to_string()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
