use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use cinerec_api::api::{create_router, AppState};
use cinerec_api::config::Config;
use cinerec_api::db::{create_pool, create_redis_client, Cache};
use cinerec_api::stores::{PgRatingSource, PgRecommendationStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url)
        .await
        .context("Failed to connect to Postgres")?;

    let redis_client = create_redis_client(&config.redis_url)?;
    // Keep the writer handle alive for the lifetime of the server so cache
    // writes are flushed on shutdown.
    let (cache, _cache_writer) = Cache::new(redis_client).await;

    let state = AppState::new(
        Arc::new(PgRatingSource::new(pool.clone())),
        Arc::new(PgRecommendationStore::new(pool)),
        Some(cache),
    );

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(addr = %addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
