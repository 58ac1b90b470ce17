//! Telegram Bot API mock for notification testing.

use std::time::{Duration, Instant};

use remitdesk_notify::ClientConfig;
use serde::Deserialize;
use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Bot token the mock expects in request paths.
pub const TEST_BOT_TOKEN: &str = "123456:TEST-TOKEN";

/// A `sendMessage` call captured by the mock.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SentMessage {
    /// Recipient exactly as sent.
    pub chat_id: Value,
    /// Message text.
    pub text: String,
}

/// Mock Telegram Bot API server.
pub struct TelegramMock {
    server: MockServer,
    token: String,
}

impl TelegramMock {
    /// Starts a mock server on a random port.
    pub async fn start() -> Self {
        Self { server: MockServer::start().await, token: TEST_BOT_TOKEN.to_string() }
    }

    /// Base URL to configure the notifier with.
    pub fn api_base(&self) -> String {
        self.server.uri()
    }

    /// Bot token the mock expects.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Path of the `sendMessage` method for this token.
    pub fn send_message_path(&self) -> String {
        format!("/bot{}/sendMessage", self.token)
    }

    /// Notifier configuration pointing at this mock.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_base: self.api_base(),
            bot_token: self.token.clone(),
            timeout: Some(Duration::from_secs(5)),
            ..ClientConfig::default()
        }
    }

    /// Answers `sendMessage` the way Telegram does on success.
    pub async fn mock_ok(&self) {
        Mock::given(method("POST"))
            .and(path(self.send_message_path()))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {}})),
            )
            .mount(&self.server)
            .await;
    }

    /// Answers `sendMessage` with the given error status.
    pub async fn mock_failure(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path(self.send_message_path()))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "ok": false,
                "error_code": status,
                "description": "Bad Request: chat not found"
            })))
            .mount(&self.server)
            .await;
    }

    /// Returns every `sendMessage` call received so far.
    pub async fn received_messages(&self) -> Vec<SentMessage> {
        let send_path = self.send_message_path();
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == send_path)
            .filter_map(|request| request.body_json::<SentMessage>().ok())
            .collect()
    }

    /// Polls until at least `expected` messages arrived or `timeout` passes.
    ///
    /// Notifications are sent from a detached task, so they may land after
    /// the HTTP response.
    pub async fn wait_for_messages(&self, expected: usize, timeout: Duration) -> Vec<SentMessage> {
        let deadline = Instant::now() + timeout;
        loop {
            let messages = self.received_messages().await;
            if messages.len() >= expected || Instant::now() >= deadline {
                return messages;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}
