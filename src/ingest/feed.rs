// src/ingest/feed.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::ingest::types::{RawEntry, SourceProvider};

/// Provider for a single RSS/Atom feed URL.
///
/// `feed-rs` hides the RSS/Atom split, so `pubDate`, `published` and
/// `updated` all come back as UTC timestamps and `media:*` references are
/// already collected per entry.
pub struct RssFeedProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        client: reqwest::Client,
        timeout: Duration,
    },
}

impl RssFeedProvider {
    pub fn from_url(url: impl Into<String>, client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            mode: Mode::Http {
                url: url.into(),
                client,
                timeout,
            },
        }
    }

    /// Parse a feed document directly, without HTTP. Used by tests.
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    fn parse_entries(bytes: &[u8]) -> Result<Vec<RawEntry>> {
        let feed = feed_rs::parser::parse(bytes).context("parsing feed xml")?;

        let mut out = Vec::with_capacity(feed.entries.len());
        for entry in feed.entries {
            // An entry without a link cannot be delivered.
            let Some(link) = entry.links.first().map(|l| l.href.clone()) else {
                continue;
            };
            let media_url = entry
                .media
                .iter()
                .flat_map(|m| m.content.iter())
                .find_map(|c| c.url.as_ref().map(|u| u.to_string()));
            let title = entry.title.map(|t| t.content).unwrap_or_default();
            let summary = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .unwrap_or_default();

            out.push(RawEntry {
                title,
                link,
                summary,
                media_url,
                published: entry.published,
                updated: entry.updated,
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for RssFeedProvider {
    async fn fetch_entries(&self) -> Result<Vec<RawEntry>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_entries(s.as_bytes()),
            Mode::Http {
                url,
                client,
                timeout,
            } => {
                let rsp = client
                    .get(url)
                    .timeout(*timeout)
                    .send()
                    .await
                    .with_context(|| format!("fetching feed {url}"))?
                    .error_for_status()
                    .with_context(|| format!("feed {url} returned an error status"))?;
                let body = rsp
                    .bytes()
                    .await
                    .with_context(|| format!("reading feed body from {url}"))?;
                Self::parse_entries(&body)
            }
        }
    }

    fn name(&self) -> &str {
        match &self.mode {
            Mode::Fixture(_) => "fixture",
            Mode::Http { url, .. } => url,
        }
    }
}
