// src/naming/mod.rs
//! Author → resident association: the host-facing store contracts and the resolver.

pub mod resolver;
pub mod store;

pub use resolver::{NameResolver, DEFAULT_LOCK_TIMEOUT, MAX_RENAME_PROBES};
pub use store::{EntityPopulation, InMemoryNamingStore, NamingGuard, NamingStore, NoResidents};
