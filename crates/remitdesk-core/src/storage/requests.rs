//! Repository for request database operations.
//!
//! Rows are read in full and redacted in Rust, so the `creator` column is
//! dropped at exactly one place ([`StoredRequest::redact`]). `amount` crosses
//! the wire as text in both directions so `NUMERIC` values keep every digit.

use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    error::Result,
    models::{NewRequest, Request, RequestId, StoredRequest},
};

/// Repository for request database operations.
pub struct Repository {
    pool: Arc<PgPool>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Returns a reference to the database pool.
    pub fn pool(&self) -> Arc<PgPool> {
        self.pool.clone()
    }

    /// Inserts a request and returns the identifier assigned by the database.
    ///
    /// # Errors
    ///
    /// Returns error if insert fails or constraints are violated.
    pub async fn create(&self, request: &NewRequest) -> Result<RequestId> {
        let id = sqlx::query_scalar(
            r"
            INSERT INTO requests (request_type, country, currency, amount, bank, goods, features)
            VALUES ($1, $2, $3, $4::numeric, $5, $6, $7)
            RETURNING id
            ",
        )
        .bind(&request.request_type)
        .bind(&request.country)
        .bind(&request.currency)
        .bind(&request.amount)
        .bind(&request.bank)
        .bind(&request.goods)
        .bind(&request.features)
        .fetch_one(&*self.pool)
        .await?;

        Ok(RequestId(id))
    }

    /// Finds a request by ID.
    ///
    /// # Errors
    ///
    /// Returns error if query fails.
    pub async fn find_by_id(&self, id: RequestId) -> Result<Option<Request>> {
        let row = sqlx::query_as::<_, StoredRequest>(
            r"
            SELECT id, request_type, country, currency, amount::text AS amount, bank, goods,
                   features, creator, created_at
            FROM requests
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(row.map(StoredRequest::redact))
    }

    /// Finds all requests, oldest first.
    ///
    /// # Errors
    ///
    /// Returns error if query fails.
    pub async fn find_all(&self) -> Result<Vec<Request>> {
        let rows = sqlx::query_as::<_, StoredRequest>(
            r"
            SELECT id, request_type, country, currency, amount::text AS amount, bank, goods,
                   features, creator, created_at
            FROM requests
            ORDER BY id ASC
            ",
        )
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows.into_iter().map(StoredRequest::redact).collect())
    }

    /// Reads the raw `creator` column for a request.
    ///
    /// Exists for auditing; the value is never part of a client response.
    ///
    /// # Errors
    ///
    /// Returns error if query fails.
    pub async fn find_creator(&self, id: RequestId) -> Result<Option<String>> {
        let creator: Option<(Option<String>,)> =
            sqlx::query_as("SELECT creator FROM requests WHERE id = $1")
                .bind(id)
                .fetch_optional(&*self.pool)
                .await?;

        Ok(creator.and_then(|(c,)| c))
    }
}
