// tests/announce_gate.rs
mod common;

use chirp_relay::announce::{AnnouncementGate, ANNOUNCEMENT_AUTHOR, ANNOUNCEMENT_ITEM_ID};
use chirp_relay::sink::RecordingSink;
use chirp_relay::types::announcement_hash;
use chirp_relay::{ChirpConfig, ConfigStore, Engine, MemoryConfigStore, TickOutcome};
use common::{items, ScriptedSource};
use std::sync::Arc;

const A: &str = "/r/a/new";

fn cfg_with_hash(hash: i64) -> ChirpConfig {
    ChirpConfig {
        sources: vec![A.to_string()],
        last_seen_hash: hash,
        ..ChirpConfig::default()
    }
}

#[tokio::test]
async fn new_announcement_preempts_posts_once() {
    let source = Arc::new(
        ScriptedSource::new()
            .with_announcement("  Version 2 is out!  ")
            .with_listing(A, items(&["p1"])),
    );
    let store = Arc::new(MemoryConfigStore::new(cfg_with_hash(0)));
    let sink = Arc::new(RecordingSink::new());
    let e = Engine::new(store.clone(), source.clone(), sink.clone()).with_seed(1);

    assert_eq!(e.tick().await, TickOutcome::Announcement);
    assert_eq!(source.fetch_count(), 0);

    let msgs = sink.messages();
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0].display_name, ANNOUNCEMENT_AUTHOR);
    assert_eq!(msgs[0].item_id, ANNOUNCEMENT_ITEM_ID);
    assert_eq!(msgs[0].text, "Version 2 is out!");
    assert_eq!(msgs[0].entity_id, None);

    assert_eq!(
        store.snapshot().last_seen_hash,
        announcement_hash("Version 2 is out!")
    );
    assert_eq!(store.save_count(), 1);

    // gate is spent: regular selection resumes
    assert!(matches!(e.tick().await, TickOutcome::Emitted { .. }));
    assert_eq!(source.announcement_fetch_count(), 1);
}

#[tokio::test]
async fn seen_announcement_lets_posts_through() {
    let text = "Already shown";
    let source = Arc::new(
        ScriptedSource::new()
            .with_announcement(text)
            .with_listing(A, items(&["p1"])),
    );
    let store = Arc::new(MemoryConfigStore::new(cfg_with_hash(announcement_hash(text))));
    let sink = Arc::new(RecordingSink::new());
    let e = Engine::new(store.clone(), source, sink.clone()).with_seed(1);

    assert_eq!(
        e.tick().await,
        TickOutcome::Emitted {
            source: A.into(),
            item_id: "p1".into()
        }
    );
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn failed_check_is_not_retried() {
    let source = ScriptedSource::new().with_failing_announcement();
    let store = MemoryConfigStore::new(cfg_with_hash(0));
    let sink = RecordingSink::new();
    let mut gate = AnnouncementGate::new();

    assert!(!gate.check(&source, &store, &sink).await);
    assert!(gate.has_checked());
    assert!(!gate.check(&source, &store, &sink).await);
    assert_eq!(source.announcement_fetch_count(), 1);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn short_or_missing_text_is_no_announcement() {
    for raw in [None, Some("ok")] {
        let mut source = ScriptedSource::new();
        if let Some(t) = raw {
            source = source.with_announcement(t);
        }
        let store = MemoryConfigStore::new(cfg_with_hash(0));
        let sink = RecordingSink::new();
        let mut gate = AnnouncementGate::new();

        assert!(!gate.check(&source, &store, &sink).await);
        assert!(sink.is_empty());
        assert_eq!(store.save_count(), 0);
    }
}

#[tokio::test]
async fn fires_at_most_once_even_with_new_text_later() {
    let source = ScriptedSource::new().with_announcement("first message");
    let store = MemoryConfigStore::new(cfg_with_hash(0));
    let sink = RecordingSink::new();
    let mut gate = AnnouncementGate::new();

    assert!(gate.check(&source, &store, &sink).await);
    let source = ScriptedSource::new().with_announcement("second message");
    assert!(!gate.check(&source, &store, &sink).await);
    assert_eq!(sink.len(), 1);
}
