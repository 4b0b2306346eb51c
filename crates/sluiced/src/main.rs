//! sluiced — relays UDP datagrams to stdout through a bounded queue.
//!
//! Usage: sluiced [ADDRESS]
//!
//! Logs go to stderr; stdout carries only messages.

use std::sync::Arc;

use anyhow::{Context, Result};

use sluice_core::SluiceConfig;

mod output;
mod pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut config = SluiceConfig::load().context("failed to load config")?;
    if let Some(address) = std::env::args().nth(1) {
        config.input.address = address;
    }
    tracing::info!(
        address = %config.input.address,
        input = sluice_input::INPUT_TYPE,
        format = ?config.output.format,
        "sluiced starting"
    );

    let input = Arc::new(
        sluice_input::new_input(config.input.clone())
            .await
            .context("failed to start udp input")?,
    );

    {
        let input = input.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            if let Err(e) = input.close().await {
                tracing::warn!(error = %e, "close failed");
            }
        });
    }

    let written = pipeline::run(&*input, config.output.format, tokio::io::stdout()).await?;

    let stats = input.stats();
    tracing::info!(
        written,
        received = stats.received,
        dropped = stats.dropped,
        recv_errors = stats.recv_errors,
        "sluiced stopped"
    );
    Ok(())
}
