// src/telemetry.rs
use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;
use std::net::SocketAddr;

pub const ENV_METRICS_ADDR: &str = "CHIRP_METRICS_ADDR";

/// One-time metrics registration (so series show up on scrape before first use).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("chirp_ticks_total", "Scheduler ticks that ran.");
        describe_counter!(
            "chirp_ticks_skipped_total",
            "Ticks skipped, labelled by reason (busy, paused)."
        );
        describe_counter!("chirp_emitted_total", "Posts relayed to the sink.");
        describe_counter!("chirp_fetch_errors_total", "Source fetch failures.");
        describe_counter!(
            "chirp_dedup_hits_total",
            "Fetched posts skipped because they were already shown."
        );
        describe_counter!(
            "chirp_filtered_items_total",
            "Fetched posts skipped as [meta] housekeeping."
        );
        describe_counter!(
            "chirp_lock_timeouts_total",
            "Rename lookups abandoned because the host lock was busy."
        );
        describe_counter!(
            "chirp_names_assigned_total",
            "Residents renamed to post authors."
        );
        describe_counter!("chirp_announcements_total", "Announcements shown.");
        describe_gauge!("chirp_interval_secs", "Configured tick interval.");
    });
}

/// Install the Prometheus recorder with its own HTTP listener on `addr`.
/// Must run inside a tokio runtime.
pub fn install_prometheus(addr: SocketAddr, interval_secs: u64) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("prometheus: install recorder")?;
    ensure_metrics_described();
    gauge!("chirp_interval_secs").set(interval_secs as f64);
    Ok(())
}
