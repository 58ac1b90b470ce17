//! Telegram Bot API client for requester notifications.
//!
//! Sends a single `sendMessage` call per notification. Delivery is
//! best-effort: no retries, no confirmation back to the caller, and the
//! transport's own timeout unless one is configured.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{info_span, Instrument};

use crate::error::{NotifyError, Result};

/// Public Telegram Bot API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Maximum number of response body bytes kept in an error.
const MAX_ERROR_BODY: usize = 1024;

/// Configuration for the notifier.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the Bot API, without trailing slash.
    pub api_base: String,
    /// Bot token; part of the request path, never logged.
    pub bot_token: String,
    /// Request timeout; `None` keeps the transport default.
    pub timeout: Option<Duration>,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            bot_token: String::new(),
            timeout: None,
            user_agent: concat!("remitdesk/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_base", &self.api_base)
            .field("bot_token", &"***")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Chat identifier of a notification recipient.
///
/// Telegram accepts either a numeric chat id or a `@channelusername`; both
/// are sent back exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecipientId {
    /// Numeric chat or user id.
    Chat(i64),
    /// Channel username or id given as a string.
    Username(String),
}

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chat(id) => write!(f, "{id}"),
            Self::Username(name) => f.write_str(name),
        }
    }
}

impl From<i64> for RecipientId {
    fn from(id: i64) -> Self {
        Self::Chat(id)
    }
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a RecipientId,
    text: &'a str,
}

/// Shared Telegram notifier.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    config: ClientConfig,
}

impl TelegramNotifier {
    /// Creates a notifier with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Configuration` if the HTTP client cannot be
    /// built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(&config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| NotifyError::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Returns the configuration this notifier was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Full `sendMessage` URL, including the bot token.
    fn endpoint_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token
        )
    }

    /// `sendMessage` URL with the token masked, for logs.
    pub fn masked_endpoint(&self) -> String {
        format!("{}/bot***/sendMessage", self.config.api_base.trim_end_matches('/'))
    }

    /// Sends one message and reports the outcome.
    ///
    /// # Errors
    ///
    /// - `Timeout` if the transport timed out
    /// - `Network` for connection or protocol failures
    /// - `Rejected` for any non-2xx response
    pub async fn send_message(&self, recipient: &RecipientId, text: &str) -> Result<()> {
        let span = info_span!(
            "telegram_notification",
            chat_id = %recipient,
            endpoint = %self.masked_endpoint(),
        );

        async move {
            let started = std::time::Instant::now();

            let response = self
                .client
                .post(self.endpoint_url())
                .json(&SendMessage { chat_id: recipient, text })
                .send()
                .await
                .map_err(|e| {
                    // reqwest errors carry the URL, which embeds the token
                    let e = e.without_url();
                    tracing::warn!(
                        duration_ms = started.elapsed().as_millis(),
                        "Request failed: {}",
                        e
                    );
                    if e.is_timeout() {
                        NotifyError::Timeout
                    } else {
                        NotifyError::network(e.to_string())
                    }
                })?;

            let status = response.status();
            tracing::debug!(
                status = status.as_u16(),
                duration_ms = started.elapsed().as_millis(),
                "Received response"
            );

            if status.is_success() {
                return Ok(());
            }

            let body = match response.text().await {
                Ok(body) => truncate(body),
                Err(e) => format!("[Failed to read response body: {}]", e.without_url()),
            };

            Err(NotifyError::rejected(status.as_u16(), body))
        }
        .instrument(span)
        .await
    }

    /// Sends a message, logging and swallowing any failure.
    pub async fn notify(&self, recipient: &RecipientId, text: &str) {
        match self.send_message(recipient, text).await {
            Ok(()) => tracing::info!(chat_id = %recipient, "Notification delivered"),
            Err(e) => tracing::error!(
                chat_id = %recipient,
                error = %e,
                kind = e.kind(),
                "Failed to send notification"
            ),
        }
    }

    /// Submits a notification as a detached task.
    ///
    /// The caller does not wait for the outcome and learns nothing about it;
    /// failures are logged by the task. No ordering is guaranteed relative to
    /// other work. The handle is returned only so tests can await completion.
    pub fn dispatch(&self, recipient: RecipientId, text: String) -> JoinHandle<()> {
        let notifier = self.clone();
        tokio::spawn(async move { notifier.notify(&recipient, &text).await })
    }
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push_str("... (truncated)");
    }
    body
}
