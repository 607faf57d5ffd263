// =============================================================================
// bitfx-request — Main Entry Point
// =============================================================================
//
// Prints one rate summary per USD symbol on stdout. Warnings (empty candle
// lists, rate-limited requests, backoff pauses) go to stderr with timestamps.
//
// Usage: bitfx-request [config.json]
// =============================================================================

use anyhow::{Context, Result};
use futures_util::StreamExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bitfx_request::{BitfinexClient, ClientConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ClientConfig::load(&path)?,
        None => ClientConfig::default(),
    };

    let client = BitfinexClient::new(&config).context("failed to build Bitfinex client")?;
    info!(base_url = client.base_url(), "fetching rates");

    let mut rates = client
        .get_rates(&config)
        .await
        .context("failed to list Bitfinex symbols")?;

    while let Some(rate) = rates.next().await {
        match rate {
            Some(summary) => println!("{summary}"),
            None => println!("None"),
        }
    }

    Ok(())
}
