//! In-memory [`RequestStore`] for tests that should not need PostgreSQL.
//!
//! Mirrors the database behaviour that matters to callers: sequential ids,
//! a populated `creator` column, redaction on every read, and insertion-order
//! listing. Failures and latency can be injected to exercise error paths.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::Utc;
use tokio::sync::RwLock;

use super::{RequestStore, StoreFuture};
use crate::{
    error::CoreError,
    models::{NewRequest, Request, RequestId, StoredRequest},
};

/// Creator value written to every row by the mock.
pub const MOCK_CREATOR: &str = "remitdesk_test";

/// Mock storage backed by a map.
#[derive(Clone)]
pub struct MockRequestStore {
    rows: Arc<RwLock<BTreeMap<RequestId, StoredRequest>>>,
    next_id: Arc<AtomicI64>,
    failure: Arc<RwLock<Option<String>>>,
    delay: Arc<RwLock<Option<Duration>>>,
}

impl MockRequestStore {
    /// Creates an empty store whose first id is 1.
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(BTreeMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
            failure: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(None)),
        }
    }

    /// Makes every subsequent operation fail with a database error.
    pub async fn inject_failure(&self, message: impl Into<String>) {
        *self.failure.write().await = Some(message.into());
    }

    /// Clears a previously injected failure.
    pub async fn clear_failure(&self) {
        *self.failure.write().await = None;
    }

    /// Makes every subsequent operation wait before running.
    pub async fn inject_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Returns raw rows, including the storage-only `creator` column.
    pub async fn stored_rows(&self) -> Vec<StoredRequest> {
        self.rows.read().await.values().cloned().collect()
    }

    /// Number of rows currently held.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Whether the store holds no rows.
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    async fn check_failure(&self) -> crate::Result<()> {
        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self.failure.read().await.as_ref() {
            Some(message) => Err(CoreError::Database(message.clone())),
            None => Ok(()),
        }
    }
}

impl Default for MockRequestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestStore for MockRequestStore {
    fn create<'a>(&'a self, request: &'a NewRequest) -> StoreFuture<'a, RequestId> {
        Box::pin(async move {
            self.check_failure().await?;

            let id = RequestId(self.next_id.fetch_add(1, Ordering::SeqCst));
            let row = StoredRequest {
                id,
                request_type: request.request_type.clone(),
                country: request.country.clone(),
                currency: request.currency.clone(),
                amount: request.amount.clone(),
                bank: request.bank.clone(),
                goods: request.goods.clone(),
                features: request.features.clone(),
                creator: Some(MOCK_CREATOR.to_string()),
                created_at: Utc::now(),
            };
            self.rows.write().await.insert(id, row);

            Ok(id)
        })
    }

    fn find_by_id(&self, id: RequestId) -> StoreFuture<'_, Option<Request>> {
        Box::pin(async move {
            self.check_failure().await?;
            Ok(self.rows.read().await.get(&id).cloned().map(StoredRequest::redact))
        })
    }

    fn find_all(&self) -> StoreFuture<'_, Vec<Request>> {
        Box::pin(async move {
            self.check_failure().await?;
            Ok(self.rows.read().await.values().cloned().map(StoredRequest::redact).collect())
        })
    }

    fn health_check(&self) -> StoreFuture<'_, ()> {
        Box::pin(self.check_failure())
    }
}
