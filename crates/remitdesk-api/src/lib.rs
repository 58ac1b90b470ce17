//! remitdesk HTTP API.
//!
//! Accepts request submissions, persists them through a [`RequestStore`],
//! answers point and list lookups with redacted records, and hands each new
//! submission to the Telegram notifier as a detached task.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::{fmt, sync::Arc};

use remitdesk_core::RequestStore;
use remitdesk_notify::TelegramNotifier;

pub mod config;
pub mod crypto;
pub mod handlers;
pub mod server;

pub use config::Config;
pub use server::{create_router, start_server};

/// Process-wide resources injected into every handler.
///
/// Built once at startup; cloning shares the same store and HTTP client.
#[derive(Clone)]
pub struct AppState {
    /// Request persistence.
    pub store: Arc<dyn RequestStore>,
    /// Outbound requester notifications.
    pub notifier: TelegramNotifier,
    /// Signature verification for submissions.
    pub auth: AuthSettings,
}

impl AppState {
    /// Creates application state from its parts.
    pub fn new(
        store: Arc<dyn RequestStore>,
        notifier: TelegramNotifier,
        auth: AuthSettings,
    ) -> Self {
        Self { store, notifier, auth }
    }
}

/// Whether and how submissions are authenticated.
#[derive(Clone, Default)]
pub struct AuthSettings {
    secret: Option<String>,
}

impl AuthSettings {
    /// Submissions are accepted without checking `hash`.
    pub fn disabled() -> Self {
        Self { secret: None }
    }

    /// Submissions must carry a valid `hash` for the given secret.
    pub fn enabled(secret: impl Into<String>) -> Self {
        Self { secret: Some(secret.into()) }
    }

    /// Whether verification is switched on.
    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// The shared secret, when verification is on.
    pub fn secret(&self) -> Option<&str> {
        self.secret.as_deref()
    }
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings").field("enabled", &self.is_enabled()).finish()
    }
}
