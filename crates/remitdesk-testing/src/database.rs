//! PostgreSQL access for storage tests.
//!
//! Tests that need a real database connect through [`TestDatabase::connect`],
//! which fails when no database is configured.

use std::time::Duration;

use anyhow::{Context, Result};
use remitdesk_core::Storage;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

/// Environment variables consulted for the test database, in order.
const DATABASE_URL_VARS: [&str; 2] = ["TEST_DATABASE_URL", "DATABASE_URL"];

/// Handle to a provisioned test database.
#[derive(Clone)]
pub struct TestDatabase {
    pool: PgPool,
    storage: Storage,
}

impl TestDatabase {
    /// Connects and provisions the schema.
    ///
    /// # Errors
    ///
    /// Returns error if no database URL is configured or the database is
    /// unreachable.
    pub async fn connect() -> Result<Self> {
        let url = configured_url().context("DATABASE_URL environment variable is required")?;

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&url)
            .await
            .context("Failed to connect to test database")?;

        let storage = Storage::new(pool.clone());
        storage.ensure_schema().await.context("Failed to provision requests table")?;
        info!("Test database ready");

        Ok(Self { pool, storage })
    }

    /// Access to the underlying database pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Storage layer bound to this database.
    pub fn storage(&self) -> &Storage {
        &self.storage
    }
}

fn configured_url() -> Option<String> {
    DATABASE_URL_VARS
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|url| !url.trim().is_empty())
}
