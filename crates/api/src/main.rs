use anyhow::Result;
use std::time::Duration;
use tracing::info;

use fleet_maintenance_api::app::{create_app, AppState, Stores};
use fleet_maintenance_api::config::Config;
use fleet_maintenance_api::jobs::{JobRunner, PoolMetricsJob, SessionCleanupJob};
use fleet_maintenance_api::middleware::{init_metrics, logging::init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    init_logging(&config.logging);
    init_metrics()?;

    info!("Starting Fleet Maintenance API v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&config.database.pool_config()).await?;

    info!("Running database migrations...");
    persistence::db::run_migrations(&pool).await?;
    info!("Migrations completed");

    let addr = config.socket_addr()?;
    let stores = Stores::postgres(&pool, config.session.store);

    let mut jobs = JobRunner::new();
    jobs.spawn(PoolMetricsJob::new(pool.clone(), Duration::from_secs(10)));
    jobs.spawn(SessionCleanupJob::new(
        stores.sessions.clone(),
        config.session.max_age_secs,
        Duration::from_secs(3600),
    ));

    let state = AppState::new(config, stores, Some(pool))?;
    let app = create_app(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    jobs.shutdown(Duration::from_secs(5)).await;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
