//! chirp-relay daemon entrypoint.
//! Loads the config, wires a fixture content source and an in-memory resident
//! population, and runs the scheduler until Ctrl-C.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use chirp_relay::config::{
    resolve_config_path, start_hot_reload_thread, ConfigStore, FileConfigStore,
    DEFAULT_CONFIG_PATH,
};
use chirp_relay::naming::{InMemoryNamingStore, NameResolver};
use chirp_relay::sink::LogSink;
use chirp_relay::source::{JsonFixtureSource, DEFAULT_FIXTURE_PATH};
use chirp_relay::telemetry::{install_prometheus, ENV_METRICS_ADDR};
use chirp_relay::{Engine, Scheduler};

const ENV_FIXTURE_PATH: &str = "CHIRP_FIXTURE_PATH";
const ENV_RESIDENTS: &str = "CHIRP_RESIDENTS";

/// Compact logs by default; CHIRP_LOG_JSON=1 for JSON lines.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chirp_relay=info,warn"));
    let json = std::env::var("CHIRP_LOG_JSON").ok().is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

fn demo_population() -> InMemoryNamingStore {
    let n: usize = std::env::var(ENV_RESIDENTS)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(200);
    InMemoryNamingStore::with_residents((1..=n).map(|i| format!("Resident {i}")))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config_path = resolve_config_path()?.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let store = FileConfigStore::open(&config_path)?;
    start_hot_reload_thread(store.clone());
    let cfg = store.snapshot();

    if let Ok(addr) = std::env::var(ENV_METRICS_ADDR) {
        let addr = addr
            .parse()
            .with_context(|| format!("{ENV_METRICS_ADDR} is not a socket address"))?;
        install_prometheus(addr, cfg.interval_secs)?;
    }

    let fixture = std::env::var(ENV_FIXTURE_PATH).unwrap_or_else(|_| DEFAULT_FIXTURE_PATH.into());
    let content = JsonFixtureSource::from_path(Path::new(&fixture))?;

    let residents = Arc::new(demo_population());
    let engine = Engine::new(Arc::new(store.clone()), Arc::new(content), Arc::new(LogSink))
        .with_resolver(NameResolver::new(residents.clone(), residents));

    tracing::info!(
        sources = cfg.sources.len(),
        interval_secs = cfg.interval_secs,
        association_mode = u8::from(cfg.association_mode),
        "relaying a post from one of the configured sources every interval"
    );

    let scheduler = Scheduler::new(Arc::new(engine), cfg.interval());
    scheduler.start();

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    scheduler.stop_and_wait().await;
    Ok(())
}
