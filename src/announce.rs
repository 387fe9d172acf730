// src/announce.rs
use anyhow::{Context, Result};
use metrics::counter;

use crate::config::ConfigStore;
use crate::sink::MessageSink;
use crate::source::ContentSource;
use crate::types::{Announcement, Message};

pub const ANNOUNCEMENT_AUTHOR: &str = "Reddit for Chirpy";
pub const ANNOUNCEMENT_LABEL: &str = "Update";
/// Click target for announcement chirps.
pub const ANNOUNCEMENT_ITEM_ID: &str = "2z87if";

/// Shows a new operator announcement once per process, ahead of regular posts.
#[derive(Debug, Default)]
pub struct AnnouncementGate {
    checked: bool,
}

impl AnnouncementGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_checked(&self) -> bool {
        self.checked
    }

    /// True when an announcement was emitted; the caller skips post selection
    /// for this tick. Only the first call per process does any work, even if it
    /// fails.
    pub async fn check(
        &mut self,
        source: &dyn ContentSource,
        config: &dyn ConfigStore,
        sink: &dyn MessageSink,
    ) -> bool {
        if self.checked {
            return false;
        }
        self.checked = true;

        match announce_if_new(source, config, sink).await {
            Ok(fired) => fired,
            Err(e) => {
                tracing::warn!(target: "announce", error = %format!("{e:#}"), "announcement check failed");
                false
            }
        }
    }
}

async fn announce_if_new(
    source: &dyn ContentSource,
    config: &dyn ConfigStore,
    sink: &dyn MessageSink,
) -> Result<bool> {
    let raw = source
        .fetch_announcement()
        .await
        .context("fetching announcement")?;
    let Some(announcement) = raw.as_deref().and_then(Announcement::from_raw) else {
        return Ok(false);
    };

    if config.snapshot().last_seen_hash == announcement.hash {
        tracing::debug!(target: "announce", hash = announcement.hash, "announcement already seen");
        return Ok(false);
    }

    config
        .save_last_seen_hash(announcement.hash)
        .context("persisting announcement hash")?;

    sink.emit(Message {
        display_name: ANNOUNCEMENT_AUTHOR.to_string(),
        source_label: ANNOUNCEMENT_LABEL.to_string(),
        text: announcement.text,
        entity_id: None,
        item_id: ANNOUNCEMENT_ITEM_ID.to_string(),
    });
    counter!("chirp_announcements_total").increment(1);
    tracing::info!(target: "announce", hash = announcement.hash, "announcement shown");
    Ok(true)
}
