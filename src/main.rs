//! Daily News Digest Bot — Binary Entrypoint
//! Wires configuration, the Telegram transport, the feed providers, and the
//! daily trigger, then runs the command loop until shutdown.

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use news_digest_bot::config::AppConfig;
use news_digest_bot::ingest::feed::RssFeedProvider;
use news_digest_bot::ingest::image::PageImageResolver;
use news_digest_bot::ingest::scheduler;
use news_digest_bot::ingest::types::SourceProvider;
use news_digest_bot::notify::telegram::TelegramNotifier;
use news_digest_bot::{bot, digest};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("news_digest_bot=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = Arc::new(AppConfig::from_env()?);
    tracing::info!(
        sources = cfg.sources.len(),
        max_items = cfg.max_items,
        tz_offset = cfg.tz_offset_hours,
        "starting news digest bot"
    );

    let client = reqwest::Client::new();

    let providers: Arc<Vec<Box<dyn SourceProvider>>> = Arc::new(
        cfg.sources
            .iter()
            .map(|url| {
                Box::new(RssFeedProvider::from_url(
                    url.clone(),
                    client.clone(),
                    cfg.feed_timeout,
                )) as Box<dyn SourceProvider>
            })
            .collect(),
    );
    let resolver = Arc::new(PageImageResolver::new(client.clone(), cfg.page_timeout));
    let notifier = Arc::new(
        TelegramNotifier::new(cfg.telegram_token.clone(), client.clone())
            .with_timeout(cfg.send_timeout),
    );

    match cfg.chat_id {
        Some(chat_id) => {
            let cfg2 = cfg.clone();
            let providers2 = providers.clone();
            let resolver2 = resolver.clone();
            let notifier2 = notifier.clone();
            scheduler::spawn_daily(cfg.digest_time, cfg.tz_offset_hours, move || {
                let cfg = cfg2.clone();
                let providers = providers2.clone();
                let resolver = resolver2.clone();
                let notifier = notifier2.clone();
                async move {
                    digest::run_digest(
                        cfg.as_ref(),
                        providers.as_slice(),
                        resolver.as_ref(),
                        notifier.as_ref(),
                        chat_id,
                    )
                    .await;
                }
            });
        }
        None => tracing::warn!("CHAT_ID not set; the daily digest is disabled"),
    }

    tokio::select! {
        res = bot::run_command_loop(
            cfg.as_ref(),
            &client,
            notifier.as_ref(),
            providers.as_slice(),
            resolver.as_ref(),
        ) => res,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("bot stopped");
            Ok(())
        }
    }
}
