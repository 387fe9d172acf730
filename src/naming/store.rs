// src/naming/store.rs
//! Contracts the host exposes for resident naming, plus an in-memory host used by
//! the daemon and the tests.

use parking_lot::{Mutex, MutexGuard};
use rand::{Rng, RngCore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::types::EntityId;

/// Read access to the host's naming state while its shared lock is held.
pub trait NamingGuard {
    /// Resident currently carrying exactly `name` as a custom name.
    fn find_by_name(&self, name: &str) -> Option<EntityId>;
    /// Random resident slot; `None` when the population is empty.
    /// May return slots that are no longer allocated.
    fn sample_population(&self, rng: &mut dyn RngCore) -> Option<EntityId>;
    fn is_allocated(&self, entity: EntityId) -> bool;
    fn has_custom_name(&self, entity: EntityId) -> bool;
}

/// Host naming store shared with the host's own simulation thread.
pub trait NamingStore: Send + Sync {
    /// Bounded-wait acquire of the host lock. `None` on timeout.
    fn try_lock(&self, timeout: Duration) -> Option<Box<dyn NamingGuard + '_>>;
    /// Persist `name` on `entity`. Called without the lock held; the host may
    /// apply it later, and may drop it if the resident got named meanwhile.
    fn assign_name(&self, entity: EntityId, name: &str);
}

/// Resident sampling for borrowed identities (association mode 1).
pub trait EntityPopulation: Send + Sync {
    fn sample_random(&self, rng: &mut dyn RngCore) -> Option<EntityId>;
    fn current_name(&self, entity: EntityId) -> String;
}

/// Host without residents: every lookup comes back empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoResidents;

impl NamingGuard for NoResidents {
    fn find_by_name(&self, _name: &str) -> Option<EntityId> {
        None
    }
    fn sample_population(&self, _rng: &mut dyn RngCore) -> Option<EntityId> {
        None
    }
    fn is_allocated(&self, _entity: EntityId) -> bool {
        false
    }
    fn has_custom_name(&self, _entity: EntityId) -> bool {
        false
    }
}

impl NamingStore for NoResidents {
    fn try_lock(&self, _timeout: Duration) -> Option<Box<dyn NamingGuard + '_>> {
        Some(Box::new(NoResidents))
    }
    fn assign_name(&self, _entity: EntityId, _name: &str) {}
}

impl EntityPopulation for NoResidents {
    fn sample_random(&self, _rng: &mut dyn RngCore) -> Option<EntityId> {
        None
    }
    fn current_name(&self, _entity: EntityId) -> String {
        String::new()
    }
}

#[derive(Debug)]
struct Slot {
    allocated: bool,
    generated_name: String,
}

#[derive(Debug, Default)]
struct Registry {
    // slot i holds EntityId(i + 1); 0 stays "nobody"
    slots: Vec<Slot>,
    custom_names: HashMap<EntityId, String>,
}

impl Registry {
    fn slot(&self, entity: EntityId) -> Option<&Slot> {
        let idx = entity.0.checked_sub(1)? as usize;
        self.slots.get(idx)
    }

    fn slot_mut(&mut self, entity: EntityId) -> Option<&mut Slot> {
        let idx = entity.0.checked_sub(1)? as usize;
        self.slots.get_mut(idx)
    }

    fn is_allocated(&self, entity: EntityId) -> bool {
        self.slot(entity).is_some_and(|s| s.allocated)
    }

    fn push(&mut self, allocated: bool, generated_name: String) -> EntityId {
        self.slots.push(Slot {
            allocated,
            generated_name,
        });
        EntityId(self.slots.len() as u32)
    }
}

/// In-process host population guarded by a single `parking_lot` mutex.
#[derive(Debug, Default)]
pub struct InMemoryNamingStore {
    registry: Mutex<Registry>,
    samples: AtomicUsize,
    assigns: AtomicUsize,
    lost_races: AtomicUsize,
}

/// Host-side hold on the store lock; released on drop.
pub struct HostLock<'a> {
    _guard: MutexGuard<'a, Registry>,
}

struct LockedRegistry<'a> {
    registry: MutexGuard<'a, Registry>,
    samples: &'a AtomicUsize,
}

impl NamingGuard for LockedRegistry<'_> {
    fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.registry
            .custom_names
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(id, _)| *id)
    }

    fn sample_population(&self, rng: &mut dyn RngCore) -> Option<EntityId> {
        self.samples.fetch_add(1, Ordering::Relaxed);
        let n = self.registry.slots.len();
        if n == 0 {
            return None;
        }
        Some(EntityId(rng.random_range(0..n) as u32 + 1))
    }

    fn is_allocated(&self, entity: EntityId) -> bool {
        self.registry.is_allocated(entity)
    }

    fn has_custom_name(&self, entity: EntityId) -> bool {
        self.registry.custom_names.contains_key(&entity)
    }
}

impl InMemoryNamingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_residents<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        for n in names {
            store.add_resident(n);
        }
        store
    }

    pub fn add_resident(&self, generated_name: impl Into<String>) -> EntityId {
        self.registry.lock().push(true, generated_name.into())
    }

    /// A slot whose resident moved out; sampling can still land on it.
    pub fn add_vacancy(&self) -> EntityId {
        self.registry.lock().push(false, String::new())
    }

    /// Host-side rename (e.g. the player naming a resident).
    pub fn rename(&self, entity: EntityId, name: impl Into<String>) {
        let mut reg = self.registry.lock();
        if reg.is_allocated(entity) {
            reg.custom_names.insert(entity, name.into());
        }
    }

    /// Resident moved out: slot stays, identity and custom name go.
    pub fn release(&self, entity: EntityId) {
        let mut reg = self.registry.lock();
        reg.custom_names.remove(&entity);
        if let Some(slot) = reg.slot_mut(entity) {
            slot.allocated = false;
        }
    }

    pub fn custom_name(&self, entity: EntityId) -> Option<String> {
        self.registry.lock().custom_names.get(&entity).cloned()
    }

    pub fn population(&self) -> usize {
        self.registry.lock().slots.len()
    }

    /// Number of `sample_population` calls made under the lock.
    pub fn sample_calls(&self) -> usize {
        self.samples.load(Ordering::Relaxed)
    }

    pub fn assign_calls(&self) -> usize {
        self.assigns.load(Ordering::Relaxed)
    }

    /// Assignments dropped because the resident was named or gone by then.
    pub fn lost_races(&self) -> usize {
        self.lost_races.load(Ordering::Relaxed)
    }

    /// Hold the store lock as the host simulation would.
    pub fn hold_lock(&self) -> HostLock<'_> {
        HostLock {
            _guard: self.registry.lock(),
        }
    }
}

impl NamingStore for InMemoryNamingStore {
    fn try_lock(&self, timeout: Duration) -> Option<Box<dyn NamingGuard + '_>> {
        let registry = self.registry.try_lock_for(timeout)?;
        Some(Box::new(LockedRegistry {
            registry,
            samples: &self.samples,
        }))
    }

    fn assign_name(&self, entity: EntityId, name: &str) {
        self.assigns.fetch_add(1, Ordering::Relaxed);
        let mut reg = self.registry.lock();
        if !reg.is_allocated(entity) || reg.custom_names.contains_key(&entity) {
            self.lost_races.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(target: "naming", %entity, "rename lost race, skipped");
            return;
        }
        reg.custom_names.insert(entity, name.to_string());
    }
}

impl EntityPopulation for InMemoryNamingStore {
    fn sample_random(&self, rng: &mut dyn RngCore) -> Option<EntityId> {
        let reg = self.registry.lock();
        let allocated: Vec<usize> = reg
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.allocated)
            .map(|(i, _)| i)
            .collect();
        if allocated.is_empty() {
            return None;
        }
        let idx = allocated[rng.random_range(0..allocated.len())];
        Some(EntityId(idx as u32 + 1))
    }

    fn current_name(&self, entity: EntityId) -> String {
        let reg = self.registry.lock();
        if let Some(custom) = reg.custom_names.get(&entity) {
            return custom.clone();
        }
        reg.slot(entity)
            .map(|s| s.generated_name.clone())
            .unwrap_or_default()
    }
}
