//! Test infrastructure for remitdesk.
//!
//! Provides an in-process application wired to an in-memory store and a
//! mock Telegram server, request fixtures, and optional PostgreSQL access.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use axum::Router;
use remitdesk_api::{create_router, AppState, AuthSettings};
use remitdesk_core::storage::mock::MockRequestStore;
use remitdesk_notify::TelegramNotifier;

pub mod database;
pub mod fixtures;
pub mod http;

pub use database::TestDatabase;
pub use fixtures::RequestBuilder;
pub use http::{SentMessage, TelegramMock, TEST_BOT_TOKEN};

/// Request timeout applied to test routers.
const TEST_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Self-contained application for integration tests.
pub struct TestEnv {
    /// Mock Telegram Bot API.
    pub telegram: TelegramMock,
    /// Store behind the application; inspect it to see raw rows.
    pub store: MockRequestStore,
    /// Application state shared by routers built from this environment.
    pub state: AppState,
}

impl TestEnv {
    /// Builds an environment with signature verification disabled.
    ///
    /// # Errors
    ///
    /// Returns error if the notifier cannot be constructed.
    pub async fn new() -> Result<Self> {
        Self::with_auth(AuthSettings::disabled()).await
    }

    /// Builds an environment that verifies submissions with the mock's bot
    /// token.
    ///
    /// # Errors
    ///
    /// Returns error if the notifier cannot be constructed.
    pub async fn with_verification() -> Result<Self> {
        Self::with_auth(AuthSettings::enabled(TEST_BOT_TOKEN)).await
    }

    async fn with_auth(auth: AuthSettings) -> Result<Self> {
        let telegram = TelegramMock::start().await;
        let store = MockRequestStore::new();
        let notifier = TelegramNotifier::new(telegram.client_config())?;
        let state = AppState::new(Arc::new(store.clone()), notifier, auth);

        Ok(Self { telegram, store, state })
    }

    /// Router serving this environment's state.
    pub fn router(&self) -> Router {
        create_router(self.state.clone(), TEST_REQUEST_TIMEOUT)
    }
}
