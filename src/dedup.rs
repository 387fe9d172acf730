// src/dedup.rs
use std::collections::VecDeque;

/// Ids remembered per source; sized with headroom over the 5-post listing so
/// posts deleted upstream don't resurface older ones as "new".
pub const MAX_CACHED_POSTS_PER_SOURCE: usize = 50;

/// Bounded FIFO of recently shown item ids, in discovery order.
#[derive(Debug, Clone)]
pub struct DedupCache {
    ids: VecDeque<String>,
    cap: usize,
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DedupCache {
    pub fn new() -> Self {
        Self::with_capacity(MAX_CACHED_POSTS_PER_SOURCE)
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            ids: VecDeque::with_capacity(cap.min(MAX_CACHED_POSTS_PER_SOURCE) + 1),
            cap,
        }
    }

    /// Evict oldest entries until within capacity.
    pub fn trim(&mut self) {
        while self.ids.len() > self.cap {
            self.ids.pop_front();
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|x| x == id)
    }

    pub fn record(&mut self, id: impl Into<String>) {
        self.ids.push_back(id.into());
        self.trim();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}
