// src/source.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::types::Item;

/// Upper bound on posts considered per fetch.
pub const MAX_POSTS_PER_SOURCE: usize = 5;

/// Sample content shipped next to the default config.
pub const DEFAULT_FIXTURE_PATH: &str = "config/sample_posts.json";

/// Remote content: latest posts per source plus the pinned announcement.
/// Implementations should enforce their own transport timeouts; ticks are
/// serialized, so a stuck fetch delays every later tick.
#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    /// Up to [`MAX_POSTS_PER_SOURCE`] items, most recent first.
    async fn fetch_latest(&self, source: &str) -> Result<Vec<Item>>;
    async fn fetch_announcement(&self) -> Result<Option<String>>;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Default, Deserialize)]
struct FixtureDoc {
    #[serde(default)]
    posts: HashMap<String, Vec<Item>>,
    #[serde(default)]
    announcement: Option<String>,
}

/// Serves posts from a JSON document:
/// `{"posts": {"/r/a/new": [{"id":..,"author":..,"title":..,"subreddit":..}]}, "announcement": ".."}`
#[derive(Debug, Default)]
pub struct JsonFixtureSource {
    doc: FixtureDoc,
}

impl JsonFixtureSource {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let doc: FixtureDoc = serde_json::from_str(s).context("parsing content fixture json")?;
        Ok(Self { doc })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("reading content fixture {}", path.display()))?;
        Self::from_json_str(&s)
    }
}

#[async_trait::async_trait]
impl ContentSource for JsonFixtureSource {
    async fn fetch_latest(&self, source: &str) -> Result<Vec<Item>> {
        let items = self
            .doc
            .posts
            .get(source)
            .ok_or_else(|| anyhow!("no listing for source {source}"))?;
        Ok(items.iter().take(MAX_POSTS_PER_SOURCE).cloned().collect())
    }

    async fn fetch_announcement(&self) -> Result<Option<String>> {
        Ok(self.doc.announcement.clone())
    }

    fn name(&self) -> &'static str {
        "JsonFixtureSource"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "posts": {
            "/r/a/new": [
                {"id": "1", "author": "x", "title": "one", "subreddit": "a"},
                {"id": "2", "author": "x", "title": "two", "subreddit": "a"},
                {"id": "3", "author": "x", "title": "three", "subreddit": "a"},
                {"id": "4", "author": "x", "title": "four", "subreddit": "a"},
                {"id": "5", "author": "x", "title": "five", "subreddit": "a"},
                {"id": "6", "author": "x", "title": "six", "subreddit": "a"}
            ]
        }
    }"#;

    #[tokio::test]
    async fn fixture_caps_listing_and_errors_on_unknown_source() {
        let src = JsonFixtureSource::from_json_str(DOC).unwrap();
        let items = src.fetch_latest("/r/a/new").await.unwrap();
        assert_eq!(items.len(), MAX_POSTS_PER_SOURCE);
        assert_eq!(items[0].id, "1");
        assert_eq!(items[0].source_label, "a");
        assert!(src.fetch_latest("/r/missing/new").await.is_err());
        assert_eq!(src.fetch_announcement().await.unwrap(), None);
    }

    #[tokio::test]
    async fn shipped_sample_covers_default_sources() {
        let src = JsonFixtureSource::from_path(Path::new(DEFAULT_FIXTURE_PATH)).unwrap();
        for source in crate::config::default_sources() {
            let items = src.fetch_latest(&source).await.unwrap();
            assert!(!items.is_empty(), "{source} has no sample posts");
        }
        assert!(src.fetch_announcement().await.unwrap().is_some());
    }
}
