//! HTTP server for the marketplace AI layer.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use marketplace_ai::observability::{init_tracing, LogFormat};
use marketplace_ai::server;
use marketplace_ai::services::StaticListings;
use marketplace_ai::{MarketplaceClient, MarketplaceConfig};

/// Serves the marketplace AI features over HTTP.
#[derive(Debug, Parser)]
#[command(name = "marketplace-ai", version, about)]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "MARKETPLACE_BIND")]
    bind: Option<String>,

    /// Log output: pretty or json.
    #[arg(long, env = "MARKETPLACE_LOG_FORMAT", default_value = "pretty")]
    log_format: LogFormat,

    /// Listings file for catalog search.
    #[arg(long, env = "MARKETPLACE_CATALOG_PATH")]
    catalog: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    let mut config = MarketplaceConfig::from_env()?;
    if let Some(bind) = cli.bind {
        config.bind = bind.parse()?;
    }
    if let Some(catalog) = cli.catalog {
        config.catalog_path = Some(catalog);
    }
    tracing::info!(config = ?config, "Configuration loaded");

    let listings = match &config.catalog_path {
        Some(path) => StaticListings::load(path).await?,
        None => StaticListings::builtin()?,
    };
    let bind = config.bind;
    let client = MarketplaceClient::builder()
        .config(config)
        .listings(Arc::new(listings))
        .build()?;

    let listener = TcpListener::bind(bind).await?;
    server::run(listener, Arc::new(client)).await?;
    Ok(())
}
