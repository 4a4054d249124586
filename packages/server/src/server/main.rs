// Main entry point for API server

use std::sync::Arc;

use anyhow::{Context, Result};
use chat_client::GatewayClient;
use server_core::kernel::{LocalFileStorage, ServerDeps};
use server_core::{server::build_app, Config};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,chat_client=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting workflow builder API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    let mut gateway = GatewayClient::new(&config.gateway_api_key);
    if let Some(url) = &config.gateway_url {
        gateway = gateway.with_base_url(url);
    }
    tracing::info!(gateway = %gateway.base_url(), "AI gateway configured");

    let storage = LocalFileStorage::new(&config.storage_dir);
    tracing::info!(root = %storage.root().display(), "Document storage ready");

    // Build application
    let deps = ServerDeps::postgres(
        pool,
        Arc::new(storage),
        gateway,
        config.model_policy(),
    );
    let app = build_app(deps);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
