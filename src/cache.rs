//! Caller-owned bounded cache of conditioned grids and skew spectra.
//!
//! One mutex guards both lookup-or-insert and prefix invalidation, so an
//! invalidation can never interleave with a half-finished insertion. The
//! cache is an explicit object handed to the analyzer; nothing is global.
use crate::fft::Spectrum;
use crate::image::BrightnessGrid;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

pub const DEFAULT_CAPACITY: usize = 128;

#[derive(Clone, Debug)]
pub enum CachedAnalysis {
    Grid(Arc<BrightnessGrid>),
    Spectrum(Arc<Spectrum>),
}

#[derive(Debug)]
struct Lru {
    capacity: usize,
    map: HashMap<String, CachedAnalysis>,
    order: VecDeque<String>,
}

impl Lru {
    fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            map: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }

    fn insert(&mut self, key: String, value: CachedAnalysis) {
        if self.map.insert(key.clone(), value).is_some() {
            self.touch(&key);
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(old) = self.order.pop_front() {
                self.map.remove(&old);
            }
        }
    }
}

#[derive(Debug)]
pub struct AnalysisCache {
    inner: Mutex<Lru>,
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl AnalysisCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Lru::new(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Lru> {
        match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Cached entry for `key`, computing and storing it with `make` on a
    /// miss. `make` runs under the cache lock.
    pub fn get_or_insert_with<F>(&self, key: &str, make: F) -> CachedAnalysis
    where
        F: FnOnce() -> CachedAnalysis,
    {
        let mut lru = self.lock();
        if let Some(hit) = lru.map.get(key).cloned() {
            lru.touch(key);
            return hit;
        }
        let value = make();
        lru.insert(key.to_string(), value.clone());
        value
    }

    /// Cached entry for `key`, without inserting on a miss.
    pub fn get(&self, key: &str) -> Option<CachedAnalysis> {
        let mut lru = self.lock();
        let hit = lru.map.get(key).cloned();
        if hit.is_some() {
            lru.touch(key);
        }
        hit
    }

    /// Drop every entry whose key starts with `prefix`; returns how many.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut lru = self.lock();
        let before = lru.map.len();
        lru.map.retain(|k, _| !k.starts_with(prefix));
        lru.order.retain(|k| !k.starts_with(prefix));
        before - lru.map.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(v: u8) -> CachedAnalysis {
        CachedAnalysis::Grid(Arc::new(BrightnessGrid::from_raw(1, 1, vec![v])))
    }

    fn value(c: &CachedAnalysis) -> u8 {
        match c {
            CachedAnalysis::Grid(g) => g.get(0, 0),
            CachedAnalysis::Spectrum(_) => u8::MAX,
        }
    }

    #[test]
    fn hit_does_not_recompute() {
        let cache = AnalysisCache::default();
        let mut calls = 0;
        let first = cache.get_or_insert_with("p/grid", || {
            calls += 1;
            grid(7)
        });
        for _ in 0..2 {
            let again = cache.get_or_insert_with("p/grid", || {
                calls += 1;
                grid(8)
            });
            match (&first, &again) {
                (CachedAnalysis::Grid(a), CachedAnalysis::Grid(b)) => assert!(Arc::ptr_eq(a, b)),
                other => panic!("unexpected entries {other:?}"),
            }
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn least_recently_used_entry_is_evicted() {
        let cache = AnalysisCache::new(2);
        cache.get_or_insert_with("a", || grid(1));
        cache.get_or_insert_with("b", || grid(2));
        // touch a so b becomes the oldest
        cache.get_or_insert_with("a", || grid(99));
        cache.get_or_insert_with("c", || grid(3));
        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(value(&cache.get_or_insert_with("a", || grid(99))), 1);
    }

    #[test]
    fn get_refreshes_recency() {
        let cache = AnalysisCache::new(2);
        cache.get_or_insert_with("a", || grid(1));
        cache.get_or_insert_with("b", || grid(2));
        assert!(cache.get("a").is_some());
        assert!(cache.get("missing").is_none());
        cache.get_or_insert_with("c", || grid(3));
        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
    }

    #[test]
    fn prefix_invalidation_drops_one_page() {
        let cache = AnalysisCache::default();
        cache.get_or_insert_with("page1/grid", || grid(1));
        cache.get_or_insert_with("page1/fft/256", || grid(2));
        cache.get_or_insert_with("page2/grid", || grid(3));
        assert_eq!(cache.invalidate_prefix("page1/"), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("page2/grid"));
    }
}
