// src/types.rs
//! Shared value types: fetched items, emitted messages, entity bindings, announcements.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Host-owned entity (resident) handle. The host reserves `0` for "nobody",
/// so an unbound message carries `None` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One post returned by a content source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub author: String,
    pub title: String,
    /// e.g. "ShowerThoughts"; shown next to the author.
    #[serde(alias = "subreddit")]
    pub source_label: String,
}

/// How an [`EntityBinding`] came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingOrigin {
    /// No entity; the author string is shown as-is.
    Unbound,
    /// Mode 1: a random resident's identity was borrowed for this message only.
    Borrowed,
    /// Mode 2: a resident already carried the author's name.
    Existing,
    /// Mode 2: an unnamed resident was renamed to the author.
    Assigned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityBinding {
    pub entity_id: Option<EntityId>,
    pub name: String,
    pub origin: BindingOrigin,
}

impl EntityBinding {
    pub fn unbound(name: &str) -> Self {
        Self {
            entity_id: None,
            name: name.to_string(),
            origin: BindingOrigin::Unbound,
        }
    }

    pub fn bound(entity: EntityId, name: &str, origin: BindingOrigin) -> Self {
        Self {
            entity_id: Some(entity),
            name: name.to_string(),
            origin,
        }
    }
}

/// The unit handed to the message sink. At most one per tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub display_name: String,
    pub source_label: String,
    pub text: String,
    pub entity_id: Option<EntityId>,
    pub item_id: String,
}

impl Message {
    /// Build the chirp for `item`, attributed per `binding`.
    /// Titles arrive entity-escaped from the source, so they are decoded here.
    pub fn from_item(item: &Item, binding: EntityBinding) -> Self {
        let text = html_escape::decode_html_entities(&item.title)
            .trim()
            .to_string();
        Self {
            display_name: binding.name,
            source_label: item.source_label.clone(),
            text,
            entity_id: binding.entity_id,
            item_id: item.id.clone(),
        }
    }
}

/// A pinned operator announcement, keyed by the hash of its trimmed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub text: String,
    pub hash: i64,
}

impl Announcement {
    /// Texts of length <= 2 (before trimming) are treated as "no announcement".
    pub fn from_raw(raw: &str) -> Option<Self> {
        if raw.chars().count() <= 2 {
            return None;
        }
        let text = raw.trim().to_string();
        let hash = announcement_hash(&text);
        Some(Self { text, hash })
    }
}

/// Stable 64-bit digest of an announcement text (first 8 bytes of SHA-256).
/// Distinct texts can collide; a collision reads as "already seen".
pub fn announcement_hash(text: &str) -> i64 {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    i64::from_be_bytes(head)
}
