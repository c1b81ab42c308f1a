// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};

/// One syndication record as retrieved from a source. Consumed once into a
/// [`NewsItem`] or discarded, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub title: String,
    pub link: String,
    /// Summary as provided by the source, HTML allowed.
    pub summary: String,
    /// URL of the first structured media reference, when the entry has one.
    pub media_url: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

/// The normalized, deliverable unit.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    /// Plain text, at most [`crate::ingest::SUMMARY_WORDS`] tokens plus a
    /// trailing ellipsis.
    pub description: String,
    pub image: Option<String>,
}

/// Publish timestamp used for eligibility: `published` wins, `updated` is the
/// fallback. `None` means the entry cannot be time-filtered.
pub fn resolved_timestamp(entry: &RawEntry) -> Option<DateTime<Utc>> {
    entry.published.or(entry.updated)
}

/// Rolling aggregation window: the last 24 hours of wall-clock time at the
/// target timezone (UTC shifted by a fixed hour offset). Recomputed on every
/// run, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestWindow {
    offset_hours: i64,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DigestWindow {
    pub fn last_day(offset_hours: i64) -> Self {
        Self::ending_at(Utc::now(), offset_hours)
    }

    pub fn ending_at(now: DateTime<Utc>, offset_hours: i64) -> Self {
        let end = (now + Duration::hours(offset_hours)).naive_utc();
        Self {
            offset_hours,
            start: end - Duration::days(1),
            end,
        }
    }

    /// Wall-clock representation of a source-reported timestamp at the
    /// window's timezone.
    pub fn localize(&self, ts: DateTime<Utc>) -> NaiveDateTime {
        (ts + Duration::hours(self.offset_hours)).naive_utc()
    }

    /// Entries older than the window start are ineligible. The end bound is
    /// informational; sources do not publish from the future.
    pub fn includes(&self, ts: DateTime<Utc>) -> bool {
        self.localize(ts) >= self.start
    }
}

#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_entries(&self) -> Result<Vec<RawEntry>>;
    fn name(&self) -> &str;
}
