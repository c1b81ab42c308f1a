// src/digest.rs
//! One digest run: aggregate the configured sources, then deliver. Shared by
//! the scheduled trigger and the on-demand command, holds no state across
//! runs.

use tracing::info;

use crate::config::AppConfig;
use crate::ingest;
use crate::ingest::image::ImageResolver;
use crate::ingest::types::{DigestWindow, SourceProvider};
use crate::notify::{self, Notifier};

pub async fn run_digest(
    cfg: &AppConfig,
    providers: &[Box<dyn SourceProvider>],
    resolver: &dyn ImageResolver,
    notifier: &dyn Notifier,
    chat_id: i64,
) {
    let window = DigestWindow::last_day(cfg.tz_offset_hours);
    let items = ingest::aggregate(providers, &window, cfg.max_items, resolver).await;
    info!(items = items.len(), chat_id, "digest aggregated");
    notify::deliver_digest(notifier, chat_id, &items).await;
}
