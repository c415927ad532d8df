//! Configuration management for Hydragate
//!
//! Parses TOML configuration files and provides typed access to settings.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub providers: Vec<ProviderConfig>,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Upstream provider configuration
///
/// Each provider speaks the OpenAI-compatible chat-completions dialect at
/// `base_url` and advertises a fixed list of model names. Declaration order
/// in the config file is the selection order used by the provider selector.
///
/// Fields are private so validated data cannot be mutated after loading.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    name: String,
    base_url: String,
    /// Environment variable holding the bearer token, if the upstream wants one
    api_key_env: Option<String>,
    models: Vec<String>,
}

impl ProviderConfig {
    /// Get the provider name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the provider base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the environment variable that holds this provider's API key
    pub fn api_key_env(&self) -> Option<&str> {
        self.api_key_env.as_deref()
    }

    /// Get the model names this provider advertises
    pub fn models(&self) -> &[String] {
        &self.models
    }

    #[cfg(test)]
    pub fn for_tests(name: &str, base_url: &str, models: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.to_string(),
            api_key_env: None,
            models: models.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// Gateway tuning knobs
///
/// Every field has a default matching the documented behavior, so a config
/// file without a `[gateway]` section gets the stock failover policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    /// Cooldown applied uniformly to every failed provider
    #[serde(default = "default_retry_delay")]
    retry_delay_seconds: u64,
    /// Attempt cap for ordinary chat completions
    #[serde(default = "default_max_attempts")]
    max_attempts: usize,
    /// Per-attempt timeout for client traffic
    #[serde(default = "default_request_timeout")]
    request_timeout_seconds: u64,
    /// Per-attempt timeout for availability probes
    #[serde(default = "default_probe_timeout")]
    probe_timeout_seconds: u64,
    /// Interval between availability-cache refresh cycles
    #[serde(default = "default_refresh_interval")]
    refresh_interval_seconds: u64,
    /// Model used when a request does not name one
    #[serde(default)]
    default_model: Option<String>,
    /// Transient directory removed on shutdown (provider session artifacts)
    #[serde(default = "default_credential_cache_dir")]
    credential_cache_dir: String,
}

impl GatewayConfig {
    /// Cooldown window during which a failed provider is skipped
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_seconds)
    }

    /// Attempt cap for ordinary chat completions
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Per-attempt timeout for client traffic
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Per-attempt timeout for availability probes
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds)
    }

    /// Interval between availability-cache refresh cycles
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }

    /// Model used when a request does not name one
    pub fn default_model(&self) -> Option<&str> {
        self.default_model.as_deref()
    }

    /// Directory removed on shutdown
    pub fn credential_cache_dir(&self) -> &str {
        &self.credential_cache_dir
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            retry_delay_seconds: default_retry_delay(),
            max_attempts: default_max_attempts(),
            request_timeout_seconds: default_request_timeout(),
            probe_timeout_seconds: default_probe_timeout(),
            refresh_interval_seconds: default_refresh_interval(),
            default_model: None,
            credential_cache_dir: default_credential_cache_dir(),
        }
    }
}

fn default_retry_delay() -> u64 {
    300
}

fn default_max_attempts() -> usize {
    3
}

fn default_request_timeout() -> u64 {
    30
}

fn default_probe_timeout() -> u64 {
    10
}

fn default_refresh_interval() -> u64 {
    3600
}

fn default_credential_cache_dir() -> String {
    ".credential-cache".to_string()
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> crate::error::GatewayResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            crate::error::GatewayError::Config(format!(
                "failed to read {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| crate::error::GatewayError::Config(format!("invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the parsed configuration
    ///
    /// Catches misconfiguration at startup instead of at request time:
    /// empty provider lists, duplicate names, providers without models, and
    /// out-of-range tuning values are all rejected here.
    pub fn validate(&self) -> crate::error::GatewayResult<()> {
        use crate::error::GatewayError;

        if self.providers.is_empty() {
            return Err(GatewayError::Config(
                "at least one [[providers]] entry is required".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for provider in &self.providers {
            if provider.name.trim().is_empty() {
                return Err(GatewayError::Config(
                    "provider name cannot be empty".to_string(),
                ));
            }
            if !seen.insert(provider.name.as_str()) {
                return Err(GatewayError::Config(format!(
                    "duplicate provider name: '{}'",
                    provider.name
                )));
            }
            if !provider.base_url.starts_with("http://") && !provider.base_url.starts_with("https://")
            {
                return Err(GatewayError::Config(format!(
                    "provider '{}' base_url must start with http:// or https://, got '{}'",
                    provider.name, provider.base_url
                )));
            }
            if provider.models.is_empty() {
                return Err(GatewayError::Config(format!(
                    "provider '{}' must advertise at least one model",
                    provider.name
                )));
            }
        }

        if self.gateway.retry_delay_seconds == 0 {
            return Err(GatewayError::Config(
                "gateway.retry_delay_seconds must be greater than 0".to_string(),
            ));
        }
        if self.gateway.max_attempts == 0 {
            return Err(GatewayError::Config(
                "gateway.max_attempts must be at least 1".to_string(),
            ));
        }
        for (key, value) in [
            (
                "gateway.request_timeout_seconds",
                self.gateway.request_timeout_seconds,
            ),
            (
                "gateway.probe_timeout_seconds",
                self.gateway.probe_timeout_seconds,
            ),
        ] {
            if value == 0 {
                return Err(GatewayError::Config(format!(
                    "{} must be greater than 0",
                    key
                )));
            }
            if value > 300 {
                return Err(GatewayError::Config(format!(
                    "{} cannot exceed 300 seconds, got {}",
                    key, value
                )));
            }
        }
        if self.gateway.refresh_interval_seconds == 0 {
            return Err(GatewayError::Config(
                "gateway.refresh_interval_seconds must be greater than 0".to_string(),
            ));
        }

        if let Some(model) = self.gateway.default_model() {
            let advertised = self
                .providers
                .iter()
                .any(|p| p.models.iter().any(|m| m == model));
            if !advertised {
                return Err(GatewayError::Config(format!(
                    "gateway.default_model '{}' is not advertised by any provider",
                    model
                )));
            }
        }

        Ok(())
    }
}
