//! Hydragate HTTP server
//!
//! Starts an Axum web server fronting the provider pool, spawns the
//! availability-cache refresh task, and cleans up the transient credential
//! cache after a graceful shutdown.

use clap::Parser;
use hydragate::cli::{Cli, Command, generate_config_template};
use hydragate::config::Config;
use hydragate::{handlers, lifecycle, telemetry};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command {
        let template = generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(&path, template)?;
                println!("wrote configuration template to {}", path);
            }
            None => print!("{}", template),
        }
        return Ok(());
    }

    let config = Arc::new(Config::from_file(&cli.config)?);

    telemetry::init(&config.observability.log_level);

    tracing::info!(
        providers = config.providers.len(),
        "Starting Hydragate server on {}:{}",
        config.server.host,
        config.server.port
    );

    let state = handlers::AppState::new(config.clone())?;

    // Initial refresh fires immediately inside the task, then hourly ticks
    let refresh_handle = state
        .orchestrator()
        .spawn_refresh(config.gateway.refresh_interval());

    let app = handlers::build_router(state);

    let addr = SocketAddr::from((
        config
            .server
            .host
            .parse::<std::net::IpAddr>()
            .unwrap_or_else(|_| std::net::IpAddr::from([127, 0, 0, 1])),
        config.server.port,
    ));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    refresh_handle.abort();
    lifecycle::remove_credential_cache(config.gateway.credential_cache_dir());
    tracing::info!("shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install shutdown signal handler");
    }
}
