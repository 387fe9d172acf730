// src/scheduler.rs
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::engine::{Engine, TickOutcome};

struct Running {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Periodic driver for [`Engine::tick`]. First tick fires one interval after
/// `start`; overdue ticks are skipped, never queued.
pub struct Scheduler {
    engine: Arc<Engine>,
    period: Duration,
    running: Mutex<Option<Running>>,
}

impl Scheduler {
    pub fn new(engine: Arc<Engine>, period: Duration) -> Self {
        Self {
            engine,
            period,
            running: Mutex::new(None),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }

    /// Arm the timer. Returns false if already running. Must be called from
    /// within a tokio runtime.
    pub fn start(&self) -> bool {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            return false;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(run_loop(self.engine.clone(), self.period, stop_rx));
        *running = Some(Running { stop_tx, handle });

        tracing::info!(
            target: "scheduler",
            period_secs = self.period.as_secs(),
            "scheduler started"
        );
        true
    }

    /// Disarm the timer. An in-flight tick runs to completion. Returns false if
    /// it was not running.
    pub fn stop(&self) -> bool {
        let taken = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match taken {
            Some(r) => {
                let _ = r.stop_tx.send(true);
                tracing::info!(target: "scheduler", "scheduler stopped");
                true
            }
            None => false,
        }
    }

    /// Like [`stop`](Self::stop), then waits for the loop (and any in-flight tick) to finish.
    pub async fn stop_and_wait(&self) {
        let taken = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(r) = taken {
            let _ = r.stop_tx.send(true);
            if let Err(e) = r.handle.await {
                tracing::warn!(target: "scheduler", error = %e, "scheduler task ended abnormally");
            }
            tracing::info!(target: "scheduler", "scheduler stopped");
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_loop(engine: Arc<Engine>, period: Duration, mut stop_rx: watch::Receiver<bool>) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = stop_rx.changed() => break,
            _ = ticker.tick() => {}
        }

        // outside the select: stop never cancels a running tick
        let outcome = engine.tick().await;
        if outcome == TickOutcome::Busy {
            continue;
        }
        tracing::debug!(target: "scheduler", ?outcome, "tick done");

        if *stop_rx.borrow() {
            break;
        }
    }
}
