// tests/scheduler_tick.rs
mod common;

use chirp_relay::sink::{PauseFlag, RecordingSink};
use chirp_relay::{ChirpConfig, Engine, MemoryConfigStore, Scheduler, TickOutcome};
use common::{items, ScriptedSource};
use std::sync::Arc;
use std::time::Duration;

const A: &str = "/r/a/new";

fn cfg() -> ChirpConfig {
    ChirpConfig {
        interval_secs: 10,
        sources: vec![A.to_string()],
        ..ChirpConfig::default()
    }
}

fn five_posts() -> Arc<ScriptedSource> {
    Arc::new(ScriptedSource::new().with_listing(A, items(&["p1", "p2", "p3", "p4", "p5"])))
}

#[tokio::test(start_paused = true)]
async fn timer_ticks_once_per_interval_until_stopped() {
    let sink = Arc::new(RecordingSink::new());
    let engine = Arc::new(
        Engine::new(Arc::new(MemoryConfigStore::new(cfg())), five_posts(), sink.clone())
            .with_seed(3),
    );
    let scheduler = Scheduler::new(engine, cfg().interval());

    assert!(scheduler.start());
    assert!(!scheduler.start());

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(sink.len(), 0);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(sink.len(), 3);

    assert!(scheduler.stop());
    assert!(!scheduler.stop());
    tokio::time::sleep(Duration::from_secs(100)).await;
    assert_eq!(sink.len(), 3);
    assert!(!scheduler.is_running());

    // restart picks up where the caches left off
    assert!(scheduler.start());
    tokio::time::sleep(Duration::from_secs(11)).await;
    let ids: Vec<String> = sink.messages().into_iter().map(|m| m.item_id).collect();
    assert_eq!(ids, vec!["p1", "p2", "p3", "p4"]);
    scheduler.stop_and_wait().await;
}

#[tokio::test(start_paused = true)]
async fn paused_ticks_do_nothing() {
    let sink = Arc::new(RecordingSink::new());
    let source = five_posts();
    let pause = Arc::new(PauseFlag::new(true));
    let engine = Engine::new(Arc::new(MemoryConfigStore::new(cfg())), source.clone(), sink.clone())
        .with_pause(pause.clone());

    assert_eq!(engine.tick().await, TickOutcome::Paused);
    assert_eq!(source.fetch_count(), 0);
    assert_eq!(source.announcement_fetch_count(), 0);
    assert_eq!(engine.cached_ids(A).await.unwrap(), Vec::<String>::new());

    pause.set_paused(false);
    assert!(engine.tick().await.emitted());
}

#[tokio::test(start_paused = true)]
async fn overlapping_tick_is_skipped() {
    let sink = Arc::new(RecordingSink::new());
    let source = Arc::new(
        ScriptedSource::new()
            .with_listing(A, items(&["p1", "p2"]))
            .with_delay(Duration::from_secs(60)),
    );
    let engine = Arc::new(Engine::new(
        Arc::new(MemoryConfigStore::new(cfg())),
        source.clone(),
        sink.clone(),
    ));

    let slow = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.tick().await })
    };
    tokio::task::yield_now().await;

    assert_eq!(engine.tick().await, TickOutcome::Busy);
    assert_eq!(
        slow.await.unwrap(),
        TickOutcome::Emitted {
            source: A.into(),
            item_id: "p1".into()
        }
    );
    assert_eq!(sink.len(), 1);
    assert_eq!(source.fetch_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_lets_in_flight_tick_finish() {
    let sink = Arc::new(RecordingSink::new());
    let source = Arc::new(
        ScriptedSource::new()
            .with_listing(A, items(&["p1", "p2"]))
            .with_delay(Duration::from_secs(30)),
    );
    let engine = Arc::new(Engine::new(
        Arc::new(MemoryConfigStore::new(cfg())),
        source,
        sink.clone(),
    ));
    let scheduler = Scheduler::new(engine, Duration::from_secs(10));
    scheduler.start();

    // first tick starts at t=10 and is mid-fetch at t=15
    tokio::time::sleep(Duration::from_secs(15)).await;
    assert_eq!(sink.len(), 0);

    scheduler.stop_and_wait().await;
    assert_eq!(sink.len(), 1);
}
