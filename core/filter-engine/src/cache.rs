//! FILENAME: core/filter-engine/src/cache.rs
//! PURPOSE: Caller-owned memo for resolved filter menus.
//! CONTEXT: Resolving every menu walks the data once per filter. Dashboards
//! re-render far more often than the selection changes, so the host keeps one
//! of these next to its view state. Entries are keyed by the dataset version
//! the caller assigns plus the selection fingerprint; a bumped version makes
//! every older entry unreachable. The filter declarations are assumed fixed
//! for the lifetime of the cache; call `invalidate` after changing them.

use std::borrow::Borrow;
use std::collections::VecDeque;

use records::Record;
use rustc_hash::FxHashMap;

use crate::cascade::{resolve_options, FilterOptions};
use crate::definition::{ActiveFilterSet, FilterSpecs};

/// Default number of selections remembered.
pub const DEFAULT_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    dataset_version: u64,
    fingerprint: u64,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    /// Kept to rule out fingerprint collisions.
    active: ActiveFilterSet,
    options: Vec<FilterOptions>,
}

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Bounded FIFO cache of `resolve_options` results.
#[derive(Debug, Clone)]
pub struct OptionsCache {
    capacity: usize,
    entries: FxHashMap<CacheKey, CacheEntry>,
    order: VecDeque<CacheKey>,
    hits: u64,
    misses: u64,
}

impl Default for OptionsCache {
    fn default() -> Self {
        OptionsCache::with_capacity(DEFAULT_CAPACITY)
    }
}

impl OptionsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        OptionsCache {
            capacity,
            entries: FxHashMap::default(),
            order: VecDeque::with_capacity(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Returns the menus for `active` over the dataset identified by
    /// `dataset_version`, resolving them on a miss.
    pub fn get_or_resolve<R: Borrow<Record>>(
        &mut self,
        dataset_version: u64,
        records: &[R],
        active: &ActiveFilterSet,
        specs: &FilterSpecs,
    ) -> &[FilterOptions] {
        let key = CacheKey {
            dataset_version,
            fingerprint: active.fingerprint(),
        };

        let hit = matches!(self.entries.get(&key), Some(entry) if entry.active == *active);
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
            let options = resolve_options(records, active, specs);
            self.store(key, active.clone(), options);
        }

        self.entries
            .get(&key)
            .map(|entry| entry.options.as_slice())
            .unwrap_or(&[])
    }

    fn store(&mut self, key: CacheKey, active: ActiveFilterSet, options: Vec<FilterOptions>) {
        if !self.entries.contains_key(&key) {
            while self.entries.len() >= self.capacity {
                match self.order.pop_front() {
                    Some(oldest) => {
                        self.entries.remove(&oldest);
                    }
                    None => break,
                }
            }
            self.order.push_back(key);
        }
        self.entries.insert(key, CacheEntry { active, options });
    }

    /// Drops every entry. Counters are kept.
    pub fn invalidate(&mut self) {
        log::debug!(target: "cascade", "options cache cleared ({} entries)", self.entries.len());
        self.entries.clear();
        self.order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
