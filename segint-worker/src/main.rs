use anyhow::Context;
use segint_core::storage::BlobStore;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod backend;
pub mod config;
pub mod dispatcher;
pub mod poller;
pub mod repository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "segint_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Segint worker...");

    let config = config::Config::from_env().context("Failed to load worker configuration")?;
    config.validate()?;

    tracing::info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_parallel_jobs as u32 + 2)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
        .context("Failed to create database pool")?;

    let blobs = BlobStore::new(&config.blob_root);
    blobs
        .ensure_layout()
        .context("Failed to create blob store layout")?;

    let backends = backend::Backends::from_config(&config);

    let poller = poller::JobPoller::new(config, pool, blobs, backends);
    poller.run().await
}
