//! gh-proxy
//!
//! A streaming reverse proxy for GitHub release, archive, raw and gist content.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ http::server ──▶ routing (normalize, classify)
//!                                   │
//!                                   ▼
//!                         security (whitelist, blacklist, passlist)
//!                                   │
//!                     ┌─────────────┴─────────────┐
//!                     ▼                           ▼
//!              301 to mirror            http::forwarder ──▶ GitHub
//!                                               │
//!     Client ◀── fixed-size chunks ◀── http::response
//! ```

use std::path::PathBuf;

use clap::Parser;

use gh_proxy::config::load_config;
use gh_proxy::lifecycle::{self, startup::override_bind};
use gh_proxy::observability::logging::init_logging;

#[derive(Debug, Parser)]
#[command(name = "gh-proxy", version, about = "GitHub reverse-proxy gateway")]
struct Cli {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long, env = "GH_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let config = override_bind(config, cli.bind)?;

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "gh-proxy starting");

    lifecycle::run(config).await?;
    Ok(())
}
