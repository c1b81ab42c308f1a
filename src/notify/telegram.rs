// src/notify/telegram.rs
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::Notifier;

const API_BASE: &str = "https://api.telegram.org";

/// Telegram Bot API transport over plain HTTP.
#[derive(Clone)]
pub struct TelegramNotifier {
    token: String,
    client: Client,
    timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(token: String, client: Client) -> Self {
        Self {
            token,
            client,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn call(&self, method: &str, payload: serde_json::Value) -> Result<()> {
        let url = format!("{API_BASE}/bot{}/{method}", self.token);
        let rsp = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("telegram {method} request"))?;

        if !rsp.status().is_success() {
            let status = rsp.status();
            let body = rsp.text().await.unwrap_or_default();
            return Err(anyhow!("telegram {method} failed: {status}: {body}"));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_plain(&self, chat_id: i64, text: &str) -> Result<()> {
        self.call("sendMessage", json!({ "chat_id": chat_id, "text": text }))
            .await
    }

    async fn send_formatted(&self, chat_id: i64, text: &str) -> Result<()> {
        self.call(
            "sendMessage",
            json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "MarkdownV2",
            }),
        )
        .await
    }

    async fn send_photo(&self, chat_id: i64, photo_url: &str, caption: &str) -> Result<()> {
        self.call(
            "sendPhoto",
            json!({
                "chat_id": chat_id,
                "photo": photo_url,
                "caption": caption,
                "parse_mode": "MarkdownV2",
            }),
        )
        .await
    }
}
