// src/ingest/image.rs
//! Best-effort article image lookup. Failure degrades output quality, never
//! pipeline correctness, so nothing here returns an error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::warn;

#[async_trait]
pub trait ImageResolver: Send + Sync {
    /// Representative image for the page at `url`, or `None`.
    async fn resolve(&self, url: &str) -> Option<String>;
}

/// Fetches the article page and pulls an image out of its markup:
/// `og:image` meta tag first, else the first `<img>`.
pub struct PageImageResolver {
    client: Client,
    timeout: Duration,
}

impl PageImageResolver {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl ImageResolver for PageImageResolver {
    async fn resolve(&self, url: &str) -> Option<String> {
        let rsp = match self.client.get(url).timeout(self.timeout).send().await {
            Ok(rsp) => rsp,
            Err(e) => {
                warn!(error = ?e, url, "article page fetch failed");
                return None;
            }
        };
        let body = match rsp.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = ?e, url, "article page body unreadable");
                return None;
            }
        };
        extract_page_image(&body)
    }
}

/// First `og:image` content if non-empty, else the first `<img>` src.
pub(crate) fn extract_page_image(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);

    let og = Selector::parse(r#"meta[property="og:image"]"#).expect("static selector");
    if let Some(meta) = doc.select(&og).next() {
        if let Some(content) = meta.value().attr("content") {
            let content = content.trim();
            if !content.is_empty() {
                return Some(content.to_string());
            }
        }
    }

    let img = Selector::parse("img").expect("static selector");
    if let Some(el) = doc.select(&img).next() {
        if let Some(src) = el.value().attr("src") {
            let src = src.trim();
            if !src.is_empty() {
                return Some(src.to_string());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::extract_page_image;

    #[test]
    fn prefers_og_image() {
        let html = r#"<html><head>
            <meta property="og:image" content="https://cdn.example/hero.jpg">
            </head><body><img src="https://cdn.example/inline.png"></body></html>"#;
        assert_eq!(
            extract_page_image(html),
            Some("https://cdn.example/hero.jpg".to_string())
        );
    }

    #[test]
    fn falls_back_to_first_img() {
        let html = r#"<html><body>
            <img src="https://cdn.example/a.png">
            <img src="https://cdn.example/b.png">
            </body></html>"#;
        assert_eq!(
            extract_page_image(html),
            Some("https://cdn.example/a.png".to_string())
        );
    }

    #[test]
    fn empty_og_content_is_skipped() {
        let html = r#"<html><head><meta property="og:image" content="  "></head>
            <body><img src="https://cdn.example/a.png"></body></html>"#;
        assert_eq!(
            extract_page_image(html),
            Some("https://cdn.example/a.png".to_string())
        );
    }

    #[test]
    fn none_when_page_has_no_image() {
        let html = "<html><body><p>words only</p></body></html>";
        assert_eq!(extract_page_image(html), None);
    }

    #[test]
    fn img_without_src_is_ignored() {
        let html = r#"<html><body><img data-lazy="x"></body></html>"#;
        assert_eq!(extract_page_image(html), None);
    }
}
