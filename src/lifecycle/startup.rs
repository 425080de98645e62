//! Startup orchestration.
//!
//! # Responsibilities
//! - Apply command-line overrides on top of the loaded config
//! - Load the rule files
//! - Start the metrics exporter when enabled
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener binds last, so traffic only arrives once everything is ready

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::validation::validate_config;
use crate::config::{ConfigError, ProxyConfig};
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::observability::metrics::init_metrics;
use crate::security::RuleSet;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] rustls::Error),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(std::io::Error),
}

/// Replace the bind address and re-validate.
pub fn override_bind(
    mut config: ProxyConfig,
    bind: Option<String>,
) -> Result<ProxyConfig, ConfigError> {
    if let Some(bind) = bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }
    Ok(config)
}

/// Boot the gateway and serve until Ctrl-C or SIGTERM.
pub async fn run(config: ProxyConfig) -> Result<(), StartupError> {
    let shutdown = Shutdown::new();
    shutdown.on_signal();
    run_until(config, shutdown).await
}

/// Boot the gateway and serve until `shutdown` fires.
pub async fn run_until(config: ProxyConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    let rules = RuleSet::load(&config.rules);
    tracing::info!(
        whitelist = rules.whitelist.len(),
        blacklist = rules.blacklist.len(),
        passlist = rules.passlist.len(),
        "Rules loaded"
    );

    if config.observability.metrics_enabled {
        // Validation already checked the address.
        if let Ok(addr) = config.observability.metrics_address.parse::<SocketAddr>() {
            init_metrics(addr);
        }
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        mirror_base = %config.relay.mirror_base,
        size_limit = config.relay.size_limit,
        max_redirects = config.relay.max_redirects,
        "Configuration loaded"
    );

    let address = config.listener.bind_address.clone();
    let server = HttpServer::new(config, rules)?;

    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    server
        .run(listener, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve)?;

    tracing::info!("Shutdown complete");
    Ok(())
}
