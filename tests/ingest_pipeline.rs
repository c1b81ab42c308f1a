// tests/ingest_pipeline.rs
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use news_digest_bot::ingest::image::ImageResolver;
use news_digest_bot::ingest::types::{DigestWindow, RawEntry, SourceProvider};
use news_digest_bot::ingest::{aggregate, normalize};

fn entry(link: &str, published: Option<DateTime<Utc>>) -> RawEntry {
    RawEntry {
        title: format!("title for {link}"),
        link: link.to_string(),
        summary: "<p>Some plain words about a project.</p>".to_string(),
        media_url: None,
        published,
        updated: None,
    }
}

struct StaticProvider {
    label: &'static str,
    entries: Vec<RawEntry>,
    calls: Arc<AtomicUsize>,
}

impl StaticProvider {
    fn new(label: &'static str, entries: Vec<RawEntry>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                label,
                entries,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl SourceProvider for StaticProvider {
    async fn fetch_entries(&self) -> Result<Vec<RawEntry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries.clone())
    }

    fn name(&self) -> &str {
        self.label
    }
}

struct BrokenProvider;

#[async_trait]
impl SourceProvider for BrokenProvider {
    async fn fetch_entries(&self) -> Result<Vec<RawEntry>> {
        Err(anyhow!("connection refused"))
    }

    fn name(&self) -> &str {
        "broken"
    }
}

struct CountingResolver {
    calls: Arc<AtomicUsize>,
    answer: Option<String>,
}

impl CountingResolver {
    fn new(answer: Option<String>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                calls: calls.clone(),
                answer,
            },
            calls,
        )
    }
}

#[async_trait]
impl ImageResolver for CountingResolver {
    async fn resolve(&self, _url: &str) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}

#[tokio::test]
async fn window_excludes_stale_entries() {
    let (provider, _) = StaticProvider::new(
        "a",
        vec![
            entry(
                "https://a.example/fresh",
                Some(Utc::now() - Duration::hours(2)),
            ),
            entry(
                "https://a.example/stale",
                Some(Utc::now() - Duration::hours(25)),
            ),
        ],
    );
    let providers: Vec<Box<dyn SourceProvider>> = vec![Box::new(provider)];
    let (resolver, _) = CountingResolver::new(None);

    let items = aggregate(&providers, &DigestWindow::last_day(3), 7, &resolver).await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].link, "https://a.example/fresh");
}

#[tokio::test]
async fn entries_without_timestamps_are_dropped() {
    let (provider, _) = StaticProvider::new(
        "a",
        vec![
            entry("https://a.example/undated", None),
            entry(
                "https://a.example/dated",
                Some(Utc::now() - Duration::hours(1)),
            ),
        ],
    );
    let providers: Vec<Box<dyn SourceProvider>> = vec![Box::new(provider)];
    let (resolver, _) = CountingResolver::new(None);

    let items = aggregate(&providers, &DigestWindow::last_day(3), 7, &resolver).await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].link, "https://a.example/dated");
}

#[tokio::test]
async fn cap_short_circuits_before_later_sources() {
    let fresh = || Some(Utc::now() - Duration::hours(1));
    let (first, _) = StaticProvider::new(
        "a",
        vec![
            entry("https://a.example/1", fresh()),
            entry("https://a.example/2", fresh()),
            entry("https://a.example/3", fresh()),
        ],
    );
    let (second, second_calls) =
        StaticProvider::new("b", vec![entry("https://b.example/1", fresh())]);
    let providers: Vec<Box<dyn SourceProvider>> = vec![Box::new(first), Box::new(second)];
    let (resolver, _) = CountingResolver::new(None);

    let items = aggregate(&providers, &DigestWindow::last_day(3), 2, &resolver).await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].link, "https://a.example/1");
    assert_eq!(items[1].link, "https://a.example/2");
    // The cap was reached inside source a, so source b was never fetched.
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn broken_source_does_not_abort_the_run() {
    let (ok_provider, _) = StaticProvider::new(
        "b",
        vec![entry(
            "https://b.example/1",
            Some(Utc::now() - Duration::hours(1)),
        )],
    );
    let providers: Vec<Box<dyn SourceProvider>> =
        vec![Box::new(BrokenProvider), Box::new(ok_provider)];
    let (resolver, _) = CountingResolver::new(None);

    let items = aggregate(&providers, &DigestWindow::last_day(3), 7, &resolver).await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].link, "https://b.example/1");
}

#[tokio::test]
async fn output_keeps_traversal_order() {
    let fresh = |h: i64| Some(Utc::now() - Duration::hours(h));
    // Second source has the newer entry; output must still follow traversal
    // order, not recency.
    let (first, _) = StaticProvider::new("a", vec![entry("https://a.example/old", fresh(20))]);
    let (second, _) = StaticProvider::new("b", vec![entry("https://b.example/new", fresh(1))]);
    let providers: Vec<Box<dyn SourceProvider>> = vec![Box::new(first), Box::new(second)];
    let (resolver, _) = CountingResolver::new(None);

    let items = aggregate(&providers, &DigestWindow::last_day(3), 7, &resolver).await;
    let links: Vec<&str> = items.iter().map(|i| i.link.as_str()).collect();
    assert_eq!(links, vec!["https://a.example/old", "https://b.example/new"]);
}

#[tokio::test]
async fn media_reference_skips_the_resolver() {
    let mut e = entry("https://a.example/with-media", Some(Utc::now()));
    e.media_url = Some("https://cdn.example/media.jpg".to_string());
    let (resolver, resolver_calls) =
        CountingResolver::new(Some("https://cdn.example/page.jpg".into()));

    let item = normalize(e, &resolver).await.expect("normalized");
    assert_eq!(item.image.as_deref(), Some("https://cdn.example/media.jpg"));
    assert_eq!(resolver_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn resolver_miss_leaves_image_absent() {
    let e = entry("https://a.example/no-media", Some(Utc::now()));
    let (resolver, resolver_calls) = CountingResolver::new(None);

    let item = normalize(e, &resolver).await.expect("normalized");
    assert_eq!(item.image, None);
    assert_eq!(resolver_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn normalize_rejects_missing_timestamps() {
    let e = entry("https://a.example/undated", None);
    let (resolver, resolver_calls) = CountingResolver::new(None);

    assert!(normalize(e, &resolver).await.is_none());
    // Rejection happens before any enrichment work.
    assert_eq!(resolver_calls.load(Ordering::SeqCst), 0);
}
