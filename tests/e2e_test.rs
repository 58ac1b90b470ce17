//! End-to-end tests over a real TCP listener.
//!
//! Drives the service the way a client would: submit, look up, list, and
//! observe the notification arriving at the mock Telegram API.

use std::{net::SocketAddr, time::Duration};

use anyhow::Result;
use remitdesk_testing::{RequestBuilder, TestEnv, TEST_BOT_TOKEN};
use serde_json::{json, Value};

struct RunningServer {
    addr: SocketAddr,
    client: reqwest::Client,
}

impl RunningServer {
    async fn start(env: &TestEnv) -> Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = env.router();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { addr, client: reqwest::Client::new() })
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn submit(&self, body: &Value) -> Result<(u16, Value)> {
        let response = self.client.post(self.url("/submit")).json(body).send().await?;
        Ok((response.status().as_u16(), response.json().await?))
    }

    async fn get(&self, path: &str) -> Result<(u16, Value)> {
        let response = self.client.get(self.url(path)).send().await?;
        Ok((response.status().as_u16(), response.json().await?))
    }
}

/// The golden path: submit, receive the confirmation, read it back.
#[tokio::test]
async fn golden_submit_notify_and_read_back() -> Result<()> {
    let env = TestEnv::new().await?;
    env.telegram.mock_ok().await;
    let server = RunningServer::start(&env).await?;

    let body = RequestBuilder::with_defaults()
        .request_type("export")
        .country(json!("Turkey"))
        .amount("2500.5".parse()?)
        .features(json!("Ready to pay upfront"))
        .user_id(json!(777))
        .build();

    let (status, created) = server.submit(&body).await?;
    assert_eq!(status, 200);
    assert_eq!(created["success"], true);
    let id = created["id"].as_i64().expect("numeric id");

    let sent = env.telegram.wait_for_messages(1, Duration::from_secs(2)).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].chat_id, json!(777));
    assert_eq!(
        sent[0].text,
        "Your request has been submitted:\nRequest type: export\nCountry: \"Turkey\"\nCurrency: \
         USD\nAmount: 2500.5\nBank: Tinkoff\nGoods: electronics\nFeatures: Ready to pay upfront"
    );

    let (status, fetched) = server.get(&format!("/request/{id}")).await?;
    assert_eq!(status, 200);
    assert_eq!(fetched["request_type"], "export");
    assert_eq!(fetched["country"], "Turkey");
    assert_eq!(fetched["amount"], 2500.5);
    assert!(fetched.get("creator").is_none());

    let (status, listed) = server.get("/requests").await?;
    assert_eq!(status, 200);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
    assert_eq!(listed[0]["id"], id);
    Ok(())
}

/// Username recipients are passed through untouched.
#[tokio::test]
async fn username_recipient_is_forwarded() -> Result<()> {
    let env = TestEnv::new().await?;
    env.telegram.mock_ok().await;
    let server = RunningServer::start(&env).await?;

    let body = RequestBuilder::with_defaults().user_id(json!("@trade_desk")).build();
    let (status, _) = server.submit(&body).await?;
    assert_eq!(status, 200);

    let sent = env.telegram.wait_for_messages(1, Duration::from_secs(2)).await;
    assert_eq!(sent[0].chat_id, json!("@trade_desk"));
    Ok(())
}

/// Telegram rejecting the message leaves the stored request intact.
#[tokio::test]
async fn telegram_rejection_is_invisible_to_client() -> Result<()> {
    let env = TestEnv::new().await?;
    env.telegram.mock_failure(403).await;
    let server = RunningServer::start(&env).await?;

    let (status, created) = server.submit(&RequestBuilder::with_defaults().build()).await?;
    assert_eq!(status, 200);

    // The attempt still reaches Telegram; it just fails there.
    let attempts = env.telegram.wait_for_messages(1, Duration::from_secs(2)).await;
    assert_eq!(attempts.len(), 1);

    let (status, fetched) = server.get(&format!("/request/{}", created["id"])).await?;
    assert_eq!(status, 200);
    assert_eq!(fetched["goods"], "electronics");
    Ok(())
}

/// Unreachable Telegram API does not fail submissions.
#[tokio::test]
async fn unreachable_telegram_does_not_fail_submission() -> Result<()> {
    let mut env = TestEnv::new().await?;
    let config = remitdesk_notify::ClientConfig {
        api_base: "http://127.0.0.1:1".to_string(),
        bot_token: TEST_BOT_TOKEN.to_string(),
        timeout: Some(Duration::from_millis(500)),
        ..remitdesk_notify::ClientConfig::default()
    };
    env.state.notifier = remitdesk_notify::TelegramNotifier::new(config)?;
    let server = RunningServer::start(&env).await?;

    let (status, created) = server.submit(&RequestBuilder::with_defaults().build()).await?;

    assert_eq!(status, 200);
    assert_eq!(created["success"], true);
    assert_eq!(env.store.len().await, 1);
    Ok(())
}

/// With verification on, only correctly signed submissions are stored.
#[tokio::test]
async fn verification_gates_storage() -> Result<()> {
    let env = TestEnv::with_verification().await?;
    env.telegram.mock_ok().await;
    let server = RunningServer::start(&env).await?;

    let forged = RequestBuilder::with_defaults().with_hash(1_700_000_000, "deadbeef").build();
    let (status, body) = server.submit(&forged).await?;
    assert_eq!(status, 403);
    assert_eq!(body, json!({"success": false, "message": "Verification failed"}));

    let genuine = RequestBuilder::with_defaults().signed(1_700_000_000, TEST_BOT_TOKEN).build();
    let (status, _) = server.submit(&genuine).await?;
    assert_eq!(status, 200);

    let (_, listed) = server.get("/requests").await?;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
    Ok(())
}
