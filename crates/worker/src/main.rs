//! appshell worker entry point.
//!
//! Boots the worker lifecycle (install, then activate) and then services
//! the host's fire-and-forget message channel on stdin. Logging goes to
//! stderr so stdout stays free for the host.

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod interceptor;
mod lifecycle;
mod messages;
mod prefetch;
mod response;
#[cfg(test)]
mod testing;

use appshell_client::{FetchClient, FetchConfig};
use appshell_core::{AppConfig, CacheDb, Catalog};

use lifecycle::Worker;

/// Build-time catalog literal; regenerated whenever an asset changes.
const CATALOG_JSON: &str = include_str!("../catalog.json");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let catalog = match &config.catalog_path {
        Some(path) => Catalog::from_json(&std::fs::read_to_string(path)?)?,
        None => Catalog::from_json(CATALOG_JSON)?,
    };

    tracing::info!(
        origin = %config.origin,
        resources = catalog.resources.len(),
        core = catalog.core.len(),
        "starting appshell worker"
    );

    let db = CacheDb::open(&config.db_path).await?;
    let fetcher = FetchClient::new(FetchConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
        ..FetchConfig::default()
    })?;

    let mut worker = Worker::new(db, Arc::new(catalog), Arc::new(fetcher), config.origin.clone());
    worker.install().await?;
    worker.activate().await?;

    // Fire-and-forget message channel; nothing is ever written back.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<messages::Command>() {
            Ok(command) => {
                if let Err(err) = worker.handle(command).await {
                    tracing::error!(%err, "command failed");
                }
            }
            Err(err) => tracing::warn!(%err, "ignoring message"),
        }
    }

    Ok(())
}
