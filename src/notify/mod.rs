// src/notify/mod.rs
pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use crate::ingest::types::NewsItem;

/// Transport abstraction for message delivery. The pipeline only ever talks
/// to this trait; the concrete transport lives in [`telegram`].
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Plain text, no markup interpretation.
    async fn send_plain(&self, chat_id: i64, text: &str) -> Result<()>;
    /// MarkdownV2-formatted text.
    async fn send_formatted(&self, chat_id: i64, text: &str) -> Result<()>;
    /// Image by URL with a MarkdownV2 caption.
    async fn send_photo(&self, chat_id: i64, photo_url: &str, caption: &str) -> Result<()>;
}

/// Sent when a run produces no items; an empty digest is communicated, never
/// silently skipped.
pub const NO_NEWS_TEXT: &str = "No news found in the last 24 hours.";

/// Characters reserved by Telegram MarkdownV2.
const MARKDOWN_RESERVED: &[char] = &[
    '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Escape free text so literal markup characters render as plain text.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if MARKDOWN_RESERVED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// MarkdownV2 body for one item: bold title, description, "Read more" link.
pub fn render_message(item: &NewsItem) -> String {
    format!(
        "*{}*\n\n{}\n\n[Read more]({})",
        escape_markdown(&item.title),
        escape_markdown(&item.description),
        item.link
    )
}

/// Deliver a digest to one chat, one notification per item. A failed send is
/// logged at warning level and the loop moves on; one broken item or image
/// URL never aborts the rest of the batch.
pub async fn deliver_digest(notifier: &dyn Notifier, chat_id: i64, items: &[NewsItem]) {
    if items.is_empty() {
        if let Err(e) = notifier.send_plain(chat_id, NO_NEWS_TEXT).await {
            warn!(error = ?e, chat_id, "failed to send empty-digest notice");
        }
        return;
    }

    for item in items {
        let text = render_message(item);
        let sent = match &item.image {
            Some(image) => notifier.send_photo(chat_id, image, &text).await,
            None => notifier.send_formatted(chat_id, &text).await,
        };
        if let Err(e) = sent {
            warn!(error = ?e, link = %item.link, "failed to send news item");
        }
    }
}
