// src/naming/resolver.rs
use metrics::counter;
use rand::RngCore;
use std::sync::Arc;
use std::time::Duration;

use super::store::{EntityPopulation, NamingGuard, NamingStore, NoResidents};
use crate::config::AssociationMode;
use crate::types::{BindingOrigin, EntityBinding, EntityId};

/// Random residents inspected per rename attempt before giving up.
pub const MAX_RENAME_PROBES: usize = 500;

/// Wait bound for the host naming lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(1000);

/// Maps a post author to a display name and, depending on the association
/// mode, a host resident.
#[derive(Clone)]
pub struct NameResolver {
    population: Arc<dyn EntityPopulation>,
    store: Arc<dyn NamingStore>,
    lock_timeout: Duration,
}

impl Default for NameResolver {
    fn default() -> Self {
        Self::unbound()
    }
}

impl NameResolver {
    pub fn new(population: Arc<dyn EntityPopulation>, store: Arc<dyn NamingStore>) -> Self {
        Self {
            population,
            store,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Resolver for hosts with no residents; every mode degrades to the author name.
    pub fn unbound() -> Self {
        Self::new(Arc::new(NoResidents), Arc::new(NoResidents))
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn resolve(
        &self,
        mode: AssociationMode,
        author: &str,
        rng: &mut dyn RngCore,
    ) -> EntityBinding {
        if author.is_empty() {
            return EntityBinding::unbound(author);
        }
        match mode {
            AssociationMode::Disabled => EntityBinding::unbound(author),
            AssociationMode::BorrowResident => self.borrow_identity(author, rng),
            AssociationMode::RenameResident => self.lookup_or_rename(author, rng),
        }
    }

    fn borrow_identity(&self, author: &str, rng: &mut dyn RngCore) -> EntityBinding {
        match self.population.sample_random(rng) {
            Some(id) => {
                let name = self.population.current_name(id);
                EntityBinding::bound(id, &name, BindingOrigin::Borrowed)
            }
            None => EntityBinding::unbound(author),
        }
    }

    fn lookup_or_rename(&self, author: &str, rng: &mut dyn RngCore) -> EntityBinding {
        let picked = {
            let Some(guard) = self.store.try_lock(self.lock_timeout) else {
                counter!("chirp_lock_timeouts_total").increment(1);
                tracing::warn!(
                    target: "naming",
                    timeout_ms = self.lock_timeout.as_millis() as u64,
                    "naming lock not acquired, using author name"
                );
                return EntityBinding::unbound(author);
            };

            if let Some(existing) = guard.find_by_name(author) {
                return EntityBinding::bound(existing, author, BindingOrigin::Existing);
            }
            probe_unnamed(&*guard, rng)
        };

        // lock released before the (possibly deferred) rename
        match picked {
            Some(id) => {
                self.store.assign_name(id, author);
                counter!("chirp_names_assigned_total").increment(1);
                tracing::debug!(target: "naming", entity = %id, "resident renamed to author");
                EntityBinding::bound(id, author, BindingOrigin::Assigned)
            }
            None => EntityBinding::unbound(author),
        }
    }
}

/// First sampled resident that exists and has no custom name yet.
fn probe_unnamed(guard: &dyn NamingGuard, rng: &mut dyn RngCore) -> Option<EntityId> {
    for _ in 0..MAX_RENAME_PROBES {
        let id = guard.sample_population(rng)?;
        if !guard.is_allocated(id) || guard.has_custom_name(id) {
            continue;
        }
        return Some(id);
    }
    None
}
