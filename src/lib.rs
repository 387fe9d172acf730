// src/lib.rs
// Public library surface for the daemon and integration tests.

pub mod announce;
pub mod click;
pub mod config;
pub mod dedup;
pub mod engine;
pub mod filter;
pub mod naming;
pub mod scheduler;
pub mod selector;
pub mod sink;
pub mod source;
pub mod telemetry;
pub mod types;

// ---- Re-exports for stable public API ----
pub use crate::config::{ChirpConfig, ConfigStore, FileConfigStore, MemoryConfigStore};
pub use crate::engine::{Engine, TickOutcome};
pub use crate::scheduler::Scheduler;
pub use crate::types::{EntityBinding, EntityId, Item, Message};
