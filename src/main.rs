//! `Tallybook` process entry point.
//!
//! Wires the ledger together: database connection and schema, default tab
//! seeding, and the threshold alert scheduler. The store handle is
//! constructed once here and passed to every component - no global state.
//! Shuts down cleanly on ctrl-c, aborting any in-flight threshold scan
//! between per-budget units.

use std::{sync::Arc, time::Duration};

use dotenvy::dotenv;
use tallybook::{
    config::{self, AppConfig},
    core::{alerts, ledger},
    errors::Result,
};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Non-fatal: env vars can be set externally
    dotenv().ok();

    let app_config = AppConfig::from_env()
        .inspect_err(|e| error!("Failed to load configuration: {e}"))?;
    info!(
        database_url = %app_config.database_url,
        check_interval_minutes = app_config.check_interval_minutes,
        "Configuration loaded"
    );

    let db = config::database::create_connection(&app_config.database_url)
        .await
        .inspect(|_| info!("Database connection established"))
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    config::database::create_tables(&db).await?;
    ledger::seed_default_tab(&db).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sink = Arc::new(alerts::TracingNotifier);
    let engine = tokio::spawn(alerts::run_scheduler(
        db.clone(),
        sink,
        Duration::from_secs(app_config.check_interval_minutes * 60),
        shutdown_rx,
    ));
    info!("Threshold alert engine scheduled");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);
    let _ = engine.await;

    Ok(())
}
