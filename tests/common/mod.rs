// tests/common/mod.rs
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chirp_relay::source::ContentSource;
use chirp_relay::Item;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn item(id: &str, title: &str) -> Item {
    Item {
        id: id.into(),
        author: format!("author_{id}"),
        title: title.into(),
        source_label: "TestSub".into(),
    }
}

pub fn items(ids: &[&str]) -> Vec<Item> {
    ids.iter().map(|id| item(id, &format!("post {id}"))).collect()
}

/// Content source whose answers are set by the test.
#[derive(Default)]
pub struct ScriptedSource {
    listings: Mutex<HashMap<String, Vec<Item>>>,
    failing: Mutex<Vec<String>>,
    announcement: Mutex<Option<String>>,
    announcement_fails: bool,
    delay: Option<Duration>,
    pub fetches: AtomicUsize,
    pub announcement_fetches: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listing(self, source: &str, items: Vec<Item>) -> Self {
        self.set_listing(source, items);
        self
    }

    pub fn with_failure(self, source: &str) -> Self {
        self.failing.lock().unwrap().push(source.to_string());
        self
    }

    pub fn with_announcement(self, text: &str) -> Self {
        *self.announcement.lock().unwrap() = Some(text.to_string());
        self
    }

    pub fn with_failing_announcement(mut self) -> Self {
        self.announcement_fails = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_listing(&self, source: &str, items: Vec<Item>) {
        self.listings
            .lock()
            .unwrap()
            .insert(source.to_string(), items);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn announcement_fetch_count(&self) -> usize {
        self.announcement_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentSource for ScriptedSource {
    async fn fetch_latest(&self, source: &str) -> Result<Vec<Item>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        if self.failing.lock().unwrap().iter().any(|s| s == source) {
            return Err(anyhow!("connection reset"));
        }
        Ok(self
            .listings
            .lock()
            .unwrap()
            .get(source)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_announcement(&self) -> Result<Option<String>> {
        self.announcement_fetches.fetch_add(1, Ordering::SeqCst);
        if self.announcement_fails {
            return Err(anyhow!("announcement endpoint down"));
        }
        Ok(self.announcement.lock().unwrap().clone())
    }

    fn name(&self) -> &'static str {
        "ScriptedSource"
    }
}
