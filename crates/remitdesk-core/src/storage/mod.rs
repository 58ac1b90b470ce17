//! Database access layer for submitted requests.
//!
//! The repository translates between domain models and the `requests` table.
//! Handlers reach storage through the [`RequestStore`] trait so they can run
//! against PostgreSQL in production and against [`mock::MockRequestStore`] in
//! tests. Every read path returns redacted [`Request`] values.

use std::{future::Future, pin::Pin, sync::Arc};

use sqlx::PgPool;
use tracing::debug;

pub mod mock;
pub mod requests;

use crate::{
    error::Result,
    models::{NewRequest, Request, RequestId},
};

/// Boxed future returned by [`RequestStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// DDL for the `requests` table.
///
/// `creator` is filled by the column default, never from caller input.
const REQUESTS_TABLE_DDL: &str = r"
    CREATE TABLE IF NOT EXISTS requests (
        id BIGSERIAL PRIMARY KEY,
        request_type TEXT,
        country JSONB,
        currency TEXT,
        amount NUMERIC,
        bank TEXT,
        goods TEXT,
        features JSONB,
        creator TEXT DEFAULT CURRENT_USER,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
";

/// Storage operations required by the HTTP layer.
pub trait RequestStore: Send + Sync + 'static {
    /// Inserts a new request and returns its generated identifier.
    fn create<'a>(&'a self, request: &'a NewRequest) -> StoreFuture<'a, RequestId>;

    /// Looks up one request by identifier.
    fn find_by_id(&self, id: RequestId) -> StoreFuture<'_, Option<Request>>;

    /// Returns every stored request in insertion order.
    fn find_all(&self) -> StoreFuture<'_, Vec<Request>>;

    /// Verifies the backing store is reachable.
    fn health_check(&self) -> StoreFuture<'_, ()>;
}

/// Container for repository instances sharing one connection pool.
#[derive(Clone)]
pub struct Storage {
    /// Repository for submitted requests.
    pub requests: Arc<requests::Repository>,
}

impl Storage {
    /// Creates a new storage instance with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        let pool = Arc::new(pool);

        Self { requests: Arc::new(requests::Repository::new(pool)) }
    }

    /// Performs a health check on the database connection.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Database` if the connection is unhealthy.
    pub async fn health_check(&self) -> Result<()> {
        let _: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&*self.requests.pool()).await?;

        Ok(())
    }

    /// Creates the `requests` table if it does not exist yet.
    ///
    /// This is idempotent provisioning, not a migration mechanism: an
    /// existing table is left untouched.
    ///
    /// # Errors
    ///
    /// Returns error if the DDL statement fails.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(REQUESTS_TABLE_DDL).execute(&*self.requests.pool()).await?;
        debug!("requests table ensured");

        Ok(())
    }
}

impl RequestStore for Storage {
    fn create<'a>(&'a self, request: &'a NewRequest) -> StoreFuture<'a, RequestId> {
        Box::pin(self.requests.create(request))
    }

    fn find_by_id(&self, id: RequestId) -> StoreFuture<'_, Option<Request>> {
        Box::pin(self.requests.find_by_id(id))
    }

    fn find_all(&self) -> StoreFuture<'_, Vec<Request>> {
        Box::pin(self.requests.find_all())
    }

    fn health_check(&self) -> StoreFuture<'_, ()> {
        Box::pin(Storage::health_check(self))
    }
}
