//! Command-line interface for Hydragate
//!
//! Provides argument parsing and subcommand handling for the hydragate binary.

use clap::{Parser, Subcommand};

/// Failover gateway for pooled LLM providers
#[derive(Parser)]
#[command(name = "hydragate")]
#[command(version)]
#[command(about = "Failover gateway exposing OpenAI- and Anthropic-style chat APIs")]
#[command(
    long_about = "Hydragate fronts a pool of OpenAI-compatible providers with health \
    tracking, sticky selection, retry with exponential backoff, and model fallback \
    driven by a periodically refreshed availability cache."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "hydragate.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# Hydragate Configuration
# =======================
#
# This file configures the HTTP server, the upstream provider pool, the
# failover policy, and observability settings.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "127.0.0.1"

# Port to listen on
port = 9889

# ─────────────────────────────────────────────────────────────────────────────
# PROVIDERS
# ─────────────────────────────────────────────────────────────────────────────
#
# Each provider speaks the OpenAI-compatible chat-completions dialect.
# Declaration order is the failover order: the gateway prefers the most
# recently successful provider and otherwise scans this list top to bottom.
#
# Fields:
#   - name: unique provider identifier (used in logs and health tracking)
#   - base_url: API base URL (the gateway appends /chat/completions)
#   - api_key_env: optional env var holding the bearer token
#   - models: model names this provider can serve

[[providers]]
name = "primary"
base_url = "http://localhost:8101/v1"
# api_key_env = "PRIMARY_API_KEY"
models = ["gpt-4", "gpt-4o"]

[[providers]]
name = "secondary"
base_url = "http://localhost:8102/v1"
models = ["gpt-4o", "claude-3-5-sonnet-20241022"]

# ─────────────────────────────────────────────────────────────────────────────
# GATEWAY (all optional, defaults shown)
# ─────────────────────────────────────────────────────────────────────────────

[gateway]
# Cooldown applied to a provider after a failed attempt
retry_delay_seconds = 300

# Attempt cap for ordinary chat completions
max_attempts = 3

# Per-attempt timeout for client traffic
request_timeout_seconds = 30

# Per-attempt timeout for availability probes
probe_timeout_seconds = 10

# Interval between availability-cache refresh cycles
refresh_interval_seconds = 3600

# Model used when a request does not name one (must be advertised above)
# default_model = "claude-3-5-sonnet-20241022"

# Transient directory removed on shutdown
credential_cache_dir = ".credential-cache"

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error"
log_level = "info"

# Prometheus metrics are always available at /metrics on the server port
"#
}
