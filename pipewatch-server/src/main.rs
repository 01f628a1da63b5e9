use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod db;
pub mod rate_limit;
pub mod repository;
pub mod service;

use crate::api::AppState;
use crate::config::Config;
use crate::service::trigger::RunTrigger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pipewatch_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Pipewatch server...");

    let config = Config::from_env().context("Invalid configuration")?;

    tracing::info!("Connecting to database...");

    let pool = db::create_pool(&config.database_url)
        .await
        .context("Failed to create database pool")?;

    tracing::info!("Database connection pool created");

    db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let trigger = RunTrigger::from_config(&config).context("Failed to build pipeline API client")?;
    if trigger.is_simulated() {
        tracing::warn!("PIPELINE_API_URL not set, retries will be simulated");
    }

    if config.job_api_secret.is_none() {
        tracing::warn!("JOB_API_SECRET not set, mutating endpoints are open");
    }
    if config.webhook_secret.is_none() {
        tracing::warn!("WEBHOOK_SECRET not set, the webhook accepts any caller");
    }

    let addr = config.bind_addr.clone();
    let sweep_every = config.rate_limit_sweep_interval;
    let state = AppState::new(pool, config, trigger);

    state.limiter.clone().spawn_sweeper(sweep_every);

    // Build router with all API endpoints
    let app = api::create_router(state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
