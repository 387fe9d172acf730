// src/engine.rs
//! # Tick engine
//! One tick: pause check → announcement gate → post selection. Ticks are
//! single-flight; a tick that finds another in progress is skipped.

use metrics::counter;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::announce::AnnouncementGate;
use crate::config::ConfigStore;
use crate::naming::NameResolver;
use crate::selector::{PostSelector, SelectOutcome};
use crate::sink::{MessageSink, PauseSource};
use crate::source::ContentSource;

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Previous tick still running.
    Busy,
    Paused,
    Announcement,
    NoSources,
    FetchFailed { source: String },
    NoCandidate { source: String },
    Emitted { source: String, item_id: String },
}

impl From<SelectOutcome> for TickOutcome {
    fn from(o: SelectOutcome) -> Self {
        match o {
            SelectOutcome::NoSources => Self::NoSources,
            SelectOutcome::FetchFailed { source } => Self::FetchFailed { source },
            SelectOutcome::NoCandidate { source } => Self::NoCandidate { source },
            SelectOutcome::Emitted { source, item_id } => Self::Emitted { source, item_id },
        }
    }
}

impl TickOutcome {
    pub fn emitted(&self) -> bool {
        matches!(self, Self::Emitted { .. } | Self::Announcement)
    }
}

struct TickState {
    gate: AnnouncementGate,
    selector: PostSelector,
    rng: StdRng,
}

pub struct Engine {
    config: Arc<dyn ConfigStore>,
    content: Arc<dyn ContentSource>,
    sink: Arc<dyn MessageSink>,
    pause: Arc<dyn PauseSource>,
    state: Mutex<TickState>,
}

impl Engine {
    pub fn new(
        config: Arc<dyn ConfigStore>,
        content: Arc<dyn ContentSource>,
        sink: Arc<dyn MessageSink>,
    ) -> Self {
        crate::telemetry::ensure_metrics_described();
        let selector = PostSelector::new(&config.snapshot().sources, NameResolver::unbound());
        Self {
            config,
            content,
            sink,
            pause: Arc::new(|| false),
            state: Mutex::new(TickState {
                gate: AnnouncementGate::new(),
                selector,
                rng: StdRng::from_os_rng(),
            }),
        }
    }

    pub fn with_pause(mut self, pause: Arc<dyn PauseSource>) -> Self {
        self.pause = pause;
        self
    }

    pub fn with_resolver(mut self, resolver: NameResolver) -> Self {
        let sources = self.config.snapshot().sources.clone();
        self.state.get_mut().selector = PostSelector::new(&sources, resolver);
        self
    }

    /// Deterministic source picks and resident sampling.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.state.get_mut().rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn config(&self) -> &Arc<dyn ConfigStore> {
        &self.config
    }

    /// Ids cached for `source`, oldest first; `None` until the source is first picked or configured.
    pub async fn cached_ids(&self, source: &str) -> Option<Vec<String>> {
        let state = self.state.lock().await;
        state
            .selector
            .cache(source)
            .map(|c| c.iter().map(str::to_string).collect())
    }

    pub async fn tick(&self) -> TickOutcome {
        let Ok(mut guard) = self.state.try_lock() else {
            counter!("chirp_ticks_skipped_total", "reason" => "busy").increment(1);
            tracing::debug!(target: "scheduler", "previous tick still running, skipping");
            return TickOutcome::Busy;
        };
        counter!("chirp_ticks_total").increment(1);

        if self.pause.is_paused() {
            counter!("chirp_ticks_skipped_total", "reason" => "paused").increment(1);
            return TickOutcome::Paused;
        }

        let state = &mut *guard;
        if state
            .gate
            .check(&*self.content, &*self.config, &*self.sink)
            .await
        {
            return TickOutcome::Announcement;
        }

        let cfg = self.config.snapshot();
        state
            .selector
            .run_once(&cfg, &*self.content, &*self.sink, &mut state.rng)
            .await
            .into()
    }
}
