// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Chain statistics server binary
//!
//! Loads [`ServerConfig`] from files and the environment, installs the tracing
//! subscriber (`RUST_LOG`, default `info`) and serves until SIGINT or SIGTERM.

use anyhow::{Context, Result};
use api::{Server, ServerConfig, ShutdownConfig};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = ServerConfig::from_env().context("loading server configuration")?;
    info!(
        environment = %config.environment,
        upstream = %config.blockchair.base_url,
        tracked_chains = config.blockchair.chains.len(),
        "configuration loaded"
    );

    let server = Server::new(config, ShutdownConfig::default())?;

    // serve on a worker thread rather than the main task
    tokio::spawn(server.run()).await??;

    info!("chain statistics server stopped");
    Ok(())
}
