use crate::star::{Star, StarKey};
use dashmap::DashMap;
use rolap_model::{CatalogConfig, Table as TableDef};
use std::sync::{Arc, Mutex, MutexGuard};

/// A star shared by every cube built on the same fact table.
pub type SharedStar = Arc<Mutex<Star>>;

/// Lock a shared star, recovering the guard if a previous holder panicked.
pub fn lock_star(star: &SharedStar) -> MutexGuard<'_, Star> {
    match star.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// One star per distinct fact table of a catalog.
#[derive(Debug, Default)]
pub struct StarRegistry {
    stars: DashMap<StarKey, SharedStar>,
}

impl StarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The star for `fact`, created on first request.
    ///
    /// Safe to call from several threads at once: the entry for a key is
    /// locked while the star is constructed, so at most one star is ever
    /// built per fact table identity.
    pub fn get_or_create(&self, fact: &TableDef, config: &CatalogConfig) -> SharedStar {
        let key = StarKey::for_fact(fact);
        let entry = self.stars.entry(key).or_insert_with(|| {
            log::debug!("creating star for fact table {}", fact.alias());
            Arc::new(Mutex::new(Star::new(fact, config)))
        });
        Arc::clone(entry.value())
    }

    pub fn get(&self, key: &StarKey) -> Option<SharedStar> {
        self.stars.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    /// Every star, ordered by key.
    pub fn stars(&self) -> Vec<(StarKey, SharedStar)> {
        let mut out: Vec<(StarKey, SharedStar)> = self
            .stars
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Drop every star, e.g. when the catalog is flushed.
    pub fn clear(&self) {
        self.stars.clear();
    }
}
