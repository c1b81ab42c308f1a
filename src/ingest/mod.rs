// src/ingest/mod.rs
pub mod feed;
pub mod image;
pub mod scheduler;
pub mod types;

use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use crate::ingest::image::ImageResolver;
use crate::ingest::types::{resolved_timestamp, DigestWindow, NewsItem, RawEntry, SourceProvider};

/// Whitespace-delimited tokens kept in an item description.
pub const SUMMARY_WORDS: usize = 30;

/// Strip markup from a feed summary and truncate to [`SUMMARY_WORDS`] tokens
/// joined by single spaces. The trailing ellipsis is unconditional.
pub fn summarize(html: &str) -> String {
    // 1) HTML entity decode
    let decoded = html_escape::decode_html_entities(html).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    let text = re_tags.replace_all(&decoded, "");

    // 3) Token cap
    let words: Vec<&str> = text.split_whitespace().take(SUMMARY_WORDS).collect();
    format!("{}...", words.join(" "))
}

/// Convert one raw entry into a deliverable item.
///
/// Returns `None` when the entry carries neither a `published` nor an
/// `updated` timestamp; such entries cannot be time-filtered. A structured
/// media reference short-circuits the page lookup; otherwise the resolver is
/// asked, and an absent image is a valid outcome.
pub async fn normalize(entry: RawEntry, resolver: &dyn ImageResolver) -> Option<NewsItem> {
    resolved_timestamp(&entry)?;

    let image = match entry.media_url {
        Some(url) => Some(url),
        None => resolver.resolve(&entry.link).await,
    };

    Some(NewsItem {
        title: entry.title,
        description: summarize(&entry.summary),
        link: entry.link,
        image,
    })
}

/// Bounded collector for one digest run. The per-run item cap is enforced
/// here and nowhere else.
#[derive(Debug)]
pub struct DigestBatch {
    items: Vec<NewsItem>,
    cap: usize,
}

impl DigestBatch {
    pub fn new(cap: usize) -> Self {
        Self {
            items: Vec::with_capacity(cap),
            cap,
        }
    }

    /// Append unless the batch is already at capacity.
    pub fn try_push(&mut self, item: NewsItem) -> bool {
        if self.is_full() {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.cap
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<NewsItem> {
        self.items
    }
}

/// Visit sources in configured order and collect eligible items, preserving
/// traversal order. The cap short-circuits the walk: once the batch is full,
/// remaining entries are skipped and remaining sources are never fetched.
/// A source that fails to fetch or parse is logged and skipped so it cannot
/// take down the rest of the run.
pub async fn aggregate(
    providers: &[Box<dyn SourceProvider>],
    window: &DigestWindow,
    max_items: usize,
    resolver: &dyn ImageResolver,
) -> Vec<NewsItem> {
    let mut batch = DigestBatch::new(max_items);

    'sources: for provider in providers {
        let entries = match provider.fetch_entries().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = ?e, source = provider.name(), "source fetch failed");
                continue;
            }
        };
        debug!(
            source = provider.name(),
            entries = entries.len(),
            "source fetched"
        );

        for entry in entries {
            let Some(ts) = resolved_timestamp(&entry) else {
                continue;
            };
            if !window.includes(ts) {
                continue;
            }
            let Some(item) = normalize(entry, resolver).await else {
                continue;
            };
            batch.try_push(item);
            if batch.is_full() {
                break 'sources;
            }
        }
    }

    batch.into_items()
}
