// src/bot.rs
//! Telegram command surface: a long-polling `getUpdates` loop dispatching the
//! two supported commands. `/start` replies with the chat id and the daily
//! schedule; `/news` runs a digest on demand for the invoking chat.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::digest;
use crate::ingest::image::ImageResolver;
use crate::ingest::types::SourceProvider;
use crate::notify::telegram::TelegramNotifier;
use crate::notify::Notifier;

const POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

/// Poll for updates until the process shuts down. A failed poll is logged
/// and retried after a short pause.
pub async fn run_command_loop(
    cfg: &AppConfig,
    client: &reqwest::Client,
    notifier: &TelegramNotifier,
    providers: &[Box<dyn SourceProvider>],
    resolver: &dyn ImageResolver,
) -> Result<()> {
    let mut offset: i64 = 0;
    info!("command loop started");
    loop {
        let updates = match get_updates(client, &cfg.telegram_token, offset).await {
            Ok(updates) => updates,
            Err(e) => {
                warn!(error = ?e, "polling for updates failed");
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let Some(message) = update.message else {
                continue;
            };
            let Some(text) = message.text.as_deref() else {
                continue;
            };
            let chat_id = message.chat.id;
            match command_of(text) {
                Some("start") => handle_start(cfg, notifier, chat_id).await,
                Some("news") => {
                    info!(chat_id, "on-demand digest requested");
                    digest::run_digest(cfg, providers, resolver, notifier, chat_id).await;
                }
                _ => {}
            }
        }
    }
}

/// Bare command name for `/cmd` and `/cmd@BotName` forms, `None` otherwise.
fn command_of(text: &str) -> Option<&str> {
    let cmd = text.trim().strip_prefix('/')?;
    let cmd = cmd.split_whitespace().next()?;
    Some(cmd.split('@').next().unwrap_or(cmd))
}

async fn get_updates(client: &reqwest::Client, token: &str, offset: i64) -> Result<Vec<Update>> {
    let url = format!("https://api.telegram.org/bot{token}/getUpdates");
    let rsp = client
        .get(&url)
        .query(&[
            ("offset", offset.to_string()),
            ("timeout", POLL_TIMEOUT_SECS.to_string()),
        ])
        .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 10))
        .send()
        .await
        .context("getUpdates request")?
        .error_for_status()
        .context("getUpdates non-2xx")?;

    let parsed: UpdatesResponse = rsp.json().await.context("decoding getUpdates response")?;
    if !parsed.ok {
        bail!("getUpdates returned ok=false");
    }
    Ok(parsed.result)
}

async fn handle_start(cfg: &AppConfig, notifier: &TelegramNotifier, chat_id: i64) {
    let text = format!(
        "Hi! Your chat ID: {chat_id}\nThis bot sends a news digest every day at {} (UTC{:+}).",
        cfg.digest_time.format("%H:%M"),
        cfg.tz_offset_hours
    );
    if let Err(e) = notifier.send_plain(chat_id, &text).await {
        warn!(error = ?e, chat_id, "failed to reply to /start");
    }
}
