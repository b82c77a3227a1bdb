//! Stagpark - campus parking occupancy tracker

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stagpark::{
    api::{self, AppState},
    config::Config,
    db::{self, repositories::SqlxSessionRepository},
    services::{OccupancyLedger, ReferenceService},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stagpark=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting campus parking tracker...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Open the durable store
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Ledger store opened: {}", config.database.url);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Store migrations completed");

    // Wire up services
    let ledger = Arc::new(OccupancyLedger::new(SqlxSessionRepository::boxed(
        pool.clone(),
    )));
    let reference = Arc::new(ReferenceService::new(&config.after_hours));

    let state = AppState {
        ledger,
        reference,
        alerts: config.alerts.clone(),
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
