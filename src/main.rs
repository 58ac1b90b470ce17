//! remitdesk request intake service.
//!
//! Main entry point. Loads configuration, connects to PostgreSQL, provisions
//! the schema and serves the HTTP API until a shutdown signal arrives.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use remitdesk_api::{AppState, Config};
use remitdesk_core::Storage;
use remitdesk_notify::TelegramNotifier;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    init_tracing(&config.rust_log);

    info!("Starting remitdesk");
    info!(
        database_url = %config.database_url_masked(),
        host = %config.host,
        port = config.port,
        max_connections = config.database_max_connections,
        verify_auth = config.verify_auth,
        "Configuration loaded"
    );

    let db_pool = create_database_pool(&config).await?;
    info!("Database connection pool established");

    let storage = Storage::new(db_pool.clone());
    storage.ensure_schema().await.context("Failed to provision requests table")?;
    info!("Database schema ready");

    if config.telegram_bot_token.is_empty() {
        warn!("TELEGRAM_BOT_TOKEN is not set; notifications will be rejected by Telegram");
    }
    let notifier = TelegramNotifier::new(config.to_client_config())
        .context("Failed to build Telegram notifier")?;

    let state = AppState::new(Arc::new(storage), notifier, config.auth_settings());
    let addr = config.server_addr()?;

    let served = remitdesk_api::start_server(state, addr, config.request_timeout()).await;

    db_pool.close().await;
    info!("Database connections closed");

    served.context("HTTP server failed")?;

    info!("remitdesk shutdown complete");
    Ok(())
}

/// Initializes tracing; `RUST_LOG` wins over the configured default.
fn init_tracing(default_filter: &str) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}

/// Creates the database connection pool with retry logic.
async fn create_database_pool(config: &Config) -> Result<sqlx::PgPool> {
    const MAX_RETRIES: u32 = 5;
    const RETRY_DELAY: Duration = Duration::from_secs(2);

    let mut retries = 0;

    loop {
        match PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(config.database_connection_timeout())
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => {
                sqlx::query("SELECT 1")
                    .execute(&pool)
                    .await
                    .context("Failed to verify database connection")?;

                return Ok(pool);
            },
            Err(e) if retries < MAX_RETRIES => {
                retries += 1;
                warn!(
                    attempt = retries,
                    max_retries = MAX_RETRIES,
                    error = %e,
                    "Database connection failed, retrying"
                );
                tokio::time::sleep(RETRY_DELAY).await;
            },
            Err(e) => {
                return Err(e).context("Failed to create database connection pool after retries");
            },
        }
    }
}
