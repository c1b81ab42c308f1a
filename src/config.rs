// src/config.rs
//! Process configuration. Everything is read once at startup and handed to
//! the pipeline and delivery components by reference; there are no ambient
//! globals.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveTime;

const ENV_SOURCES_PATH: &str = "DIGEST_SOURCES_PATH";

/// Feeds aggregated when no external source list is configured.
pub const DEFAULT_SOURCES: &[&str] = &[
    "https://www.dezeen.com/feed/",
    "https://www.archdaily.com/feed",
    "https://www.houzz.ru/rss",
    "https://www.idei-vashogo-doma.ru/rss.xml",
];

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telegram_token: String,
    /// Destination chat for the scheduled digest. When absent the daily job
    /// is not registered; the command surface still works.
    pub chat_id: Option<i64>,
    /// Target timezone as a fixed offset from UTC, in hours.
    pub tz_offset_hours: i64,
    pub max_items: usize,
    pub digest_time: NaiveTime,
    /// Feed URLs in delivery-bias order.
    pub sources: Vec<String>,
    pub feed_timeout: Duration,
    pub page_timeout: Duration,
    pub send_timeout: Duration,
}

impl AppConfig {
    /// Build the configuration from the process environment. A missing
    /// transport credential aborts startup with a clear diagnostic.
    pub fn from_env() -> Result<Self> {
        let telegram_token =
            std::env::var("TELEGRAM_TOKEN").context("TELEGRAM_TOKEN is not set")?;

        let chat_id = match std::env::var("CHAT_ID") {
            Ok(v) => Some(
                v.trim()
                    .parse::<i64>()
                    .context("CHAT_ID is not a valid chat id")?,
            ),
            Err(_) => None,
        };

        let digest_time = match std::env::var("DIGEST_TIME") {
            Ok(v) => NaiveTime::parse_from_str(v.trim(), "%H:%M")
                .context("DIGEST_TIME must be HH:MM")?,
            Err(_) => NaiveTime::from_hms_opt(10, 0, 0).expect("valid default time"),
        };

        Ok(Self {
            telegram_token,
            chat_id,
            tz_offset_hours: env_parse("DIGEST_TZ_OFFSET_HOURS", 3)?,
            max_items: env_parse("DIGEST_MAX_ITEMS", 7)?,
            digest_time,
            sources: load_sources_default()?,
            feed_timeout: Duration::from_secs(env_parse("FEED_TIMEOUT_SECS", 10)?),
            page_timeout: Duration::from_secs(env_parse("PAGE_TIMEOUT_SECS", 5)?),
            send_timeout: Duration::from_secs(env_parse("SEND_TIMEOUT_SECS", 10)?),
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) => v
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value")),
        Err(_) => Ok(default),
    }
}

/// Load the feed list from an explicit path. Supports TOML or JSON formats.
pub fn load_sources_from(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_sources(&content, ext.as_str())
}

/// Load the feed list using env var + fallbacks:
/// 1) $DIGEST_SOURCES_PATH
/// 2) config/sources.toml
/// 3) config/sources.json
/// 4) compiled-in defaults
pub fn load_sources_default() -> Result<Vec<String>> {
    if let Ok(p) = std::env::var(ENV_SOURCES_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_sources_from(&pb);
        } else {
            return Err(anyhow!("DIGEST_SOURCES_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/sources.toml");
    if toml_p.exists() {
        return load_sources_from(&toml_p);
    }
    let json_p = PathBuf::from("config/sources.json");
    if json_p.exists() {
        return load_sources_from(&json_p);
    }
    Ok(DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect())
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<Vec<String>> {
    // Try TOML first if hinted or content looks like toml.
    let try_toml = hint_ext == "toml" || s.contains("sources");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    // Try JSON array
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    // Fallback: also try TOML if not attempted
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported sources format"))
}

fn parse_toml(s: &str) -> Result<Vec<String>> {
    #[derive(serde::Deserialize)]
    struct TomlSources {
        sources: Vec<String>,
    }
    let v: TomlSources = toml::from_str(s)?;
    Ok(clean_list(v.sources))
}

fn parse_json(s: &str) -> Result<Vec<String>> {
    let v: Vec<String> = serde_json::from_str(s)?;
    Ok(clean_list(v))
}

/// Trim, drop empties, dedup. First occurrence wins: source order decides
/// which feeds fill the digest first, so the configured order is kept.
fn clean_list(items: Vec<String>) -> Vec<String> {
    use std::collections::HashSet;
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && seen.insert(t.to_string()) {
            out.push(t.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn parses_both_formats_and_keeps_order() {
        let toml = r#"sources = [" https://b.example/feed ", "", "https://a.example/rss", "https://b.example/feed"]"#;
        let json = r#"["https://z.example/rss", "  https://a.example/rss  ", ""]"#;
        assert_eq!(
            parse_toml(toml).unwrap(),
            vec![
                "https://b.example/feed".to_string(),
                "https://a.example/rss".to_string()
            ]
        );
        assert_eq!(
            parse_json(json).unwrap(),
            vec![
                "https://z.example/rss".to_string(),
                "https://a.example/rss".to_string()
            ]
        );
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        // Isolate CWD in a temp dir so a real config/ in the repo does not
        // interfere.
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();

        env::remove_var(ENV_SOURCES_PATH);

        // No files in the temp CWD -> compiled-in defaults
        let v = load_sources_default().unwrap();
        assert_eq!(v.len(), DEFAULT_SOURCES.len());
        assert_eq!(v[0], DEFAULT_SOURCES[0]);

        // Env var takes precedence
        let p_json = tmp.path().join("sources.json");
        fs::write(&p_json, r#"["https://only.example/feed"]"#).unwrap();
        env::set_var(ENV_SOURCES_PATH, p_json.display().to_string());
        let v2 = load_sources_default().unwrap();
        assert_eq!(v2, vec!["https://only.example/feed".to_string()]);
        env::remove_var(ENV_SOURCES_PATH);

        env::set_current_dir(&old).unwrap();
    }

    #[serial_test::serial]
    #[test]
    fn missing_token_is_a_startup_error() {
        env::remove_var("TELEGRAM_TOKEN");
        let err = AppConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("TELEGRAM_TOKEN"));
    }
}
