// src/selector.rs
use metrics::counter;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use std::collections::HashMap;
use tokio::runtime::{Handle, RuntimeFlavor};

use crate::config::ChirpConfig;
use crate::dedup::DedupCache;
use crate::naming::NameResolver;
use crate::sink::MessageSink;
use crate::source::{ContentSource, MAX_POSTS_PER_SOURCE};
use crate::types::{Item, Message};

/// Result of one selection pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    NoSources,
    FetchFailed { source: String },
    NoCandidate { source: String },
    Emitted { source: String, item_id: String },
}

/// Posts tagged "[meta]" are housekeeping, never relayed.
pub fn is_meta_post(title: &str) -> bool {
    title.trim().to_lowercase().starts_with("[meta]")
}

/// Picks a random source, fetches its newest posts and relays the first one
/// not yet shown.
pub struct PostSelector {
    caches: HashMap<String, DedupCache>,
    resolver: NameResolver,
}

impl PostSelector {
    pub fn new(sources: &[String], resolver: NameResolver) -> Self {
        let caches = sources
            .iter()
            .map(|s| (s.clone(), DedupCache::new()))
            .collect();
        Self { caches, resolver }
    }

    pub fn cache(&self, source: &str) -> Option<&DedupCache> {
        self.caches.get(source)
    }

    pub fn resolver(&self) -> &NameResolver {
        &self.resolver
    }

    pub async fn run_once(
        &mut self,
        cfg: &ChirpConfig,
        content: &dyn ContentSource,
        sink: &dyn MessageSink,
        rng: &mut StdRng,
    ) -> SelectOutcome {
        let Some(source) = cfg.sources.choose(rng).cloned() else {
            return SelectOutcome::NoSources;
        };

        // sources added by a reload get their cache on first pick
        let cache = self.caches.entry(source.clone()).or_default();
        cache.trim();

        let items = match content.fetch_latest(&source).await {
            Ok(items) => items,
            Err(e) => {
                counter!("chirp_fetch_errors_total").increment(1);
                tracing::warn!(
                    target: "selector",
                    provider = content.name(),
                    %source,
                    error = %format!("{e:#}"),
                    "fetch failed"
                );
                return SelectOutcome::FetchFailed { source };
            }
        };

        let Some(item) = first_fresh(cache, items) else {
            tracing::debug!(target: "selector", %source, "nothing new");
            return SelectOutcome::NoCandidate { source };
        };

        // rename mode may wait on the host lock
        let resolver = &self.resolver;
        let binding = run_blocking(|| resolver.resolve(cfg.association_mode, &item.author, rng));
        sink.emit(Message::from_item(&item, binding));
        cache.record(item.id.clone());
        counter!("chirp_emitted_total").increment(1);

        tracing::info!(target: "selector", %source, item_id = %item.id, "post relayed");
        SelectOutcome::Emitted {
            source,
            item_id: item.id,
        }
    }
}

/// Runs `f` via `block_in_place` on a multi-thread runtime so other tasks keep
/// their worker; elsewhere it runs inline.
fn run_blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current().map(|h| h.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(f),
        _ => f(),
    }
}

/// First item, in listing order, that is neither cached nor filtered.
fn first_fresh(cache: &DedupCache, items: Vec<Item>) -> Option<Item> {
    for item in items.into_iter().take(MAX_POSTS_PER_SOURCE) {
        if cache.contains(&item.id) {
            counter!("chirp_dedup_hits_total").increment(1);
            continue;
        }
        if is_meta_post(&item.title) {
            counter!("chirp_filtered_items_total").increment(1);
            continue;
        }
        return Some(item);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_tag_is_case_insensitive_after_trim() {
        assert!(is_meta_post("[meta] rules update"));
        assert!(is_meta_post("  [Meta] housekeeping"));
        assert!(is_meta_post("[META]"));
        assert!(!is_meta_post("about [meta] posts"));
        assert!(!is_meta_post("[metadata] x"));
    }

    #[test]
    fn first_fresh_skips_cached_then_meta() {
        let mk = |id: &str, title: &str| Item {
            id: id.into(),
            author: "a".into(),
            title: title.into(),
            source_label: "s".into(),
        };
        let mut cache = DedupCache::new();
        cache.record("p1");
        let got = first_fresh(
            &cache,
            vec![mk("p1", "old"), mk("p2", "[meta] x"), mk("p3", "fresh")],
        );
        assert_eq!(got.map(|i| i.id).as_deref(), Some("p3"));
    }
}
