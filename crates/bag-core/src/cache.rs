//! Memoization of loaded data bag items
//!
//! # Scope
//!
//! A fresh [`RecordCache`] belongs to one resolution context: each
//! [`BagContext`](crate::BagContext) creates its own, so two contexts never see
//! each other's records. Sharing is an explicit opt-in: clone the handle and
//! hand the clone to every context of the same run.
//!
//! Entries are keyed by namespace only. Contexts sharing a cache must agree on
//! which data bag item a namespace maps to, otherwise the first load wins for
//! all of them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bag_store::Record;

/// Namespace-keyed cache of loaded records.
///
/// A failed load is stored as `None` and is not retried.
#[derive(Debug, Clone, Default)]
pub struct RecordCache {
    entries: Arc<Mutex<HashMap<String, Option<Record>>>>,
}

impl RecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached record for `namespace`, calling `loader` on first use.
    ///
    /// The loader runs while the cache is locked, so concurrent first
    /// accesses through a shared handle invoke the backend once. It must not
    /// call back into the same cache.
    pub fn get_or_load<F>(&self, namespace: &str, loader: F) -> Option<Record>
    where
        F: FnOnce() -> Option<Record>,
    {
        let mut entries = self.lock();
        if let Some(cached) = entries.get(namespace) {
            tracing::trace!(namespace, hit = cached.is_some(), "Record cache hit");
            return cached.clone();
        }

        let loaded = loader();
        entries.insert(namespace.to_string(), loaded.clone());
        loaded
    }

    /// Whether `namespace` has been resolved, successfully or not.
    pub fn contains(&self, namespace: &str) -> bool {
        self.lock().contains_key(namespace)
    }

    /// Forget the entry for `namespace` so the next access reloads it.
    pub fn invalidate(&self, namespace: &str) -> bool {
        self.lock().remove(namespace).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Whether another handle refers to the same entries.
    pub fn is_shared(&self) -> bool {
        Arc::strong_count(&self.entries) > 1
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Option<Record>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    fn record(port: u16) -> Record {
        json!({ "port": port }).as_object().cloned().unwrap()
    }

    #[test]
    fn loader_runs_once_per_namespace() {
        let cache = RecordCache::new();
        let calls = Cell::new(0);

        for _ in 0..5 {
            let loaded = cache.get_or_load("mysql", || {
                calls.set(calls.get() + 1);
                Some(record(3307))
            });
            assert_eq!(loaded, Some(record(3307)));
        }

        assert_eq!(calls.get(), 1);
        assert!(cache.contains("mysql"));
    }

    #[test]
    fn failed_load_is_cached_as_absent() {
        let cache = RecordCache::new();
        let calls = Cell::new(0);

        for _ in 0..3 {
            let loaded = cache.get_or_load("mysql", || {
                calls.set(calls.get() + 1);
                None
            });
            assert_eq!(loaded, None);
        }

        assert_eq!(calls.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn namespaces_are_independent() {
        let cache = RecordCache::new();
        cache.get_or_load("mysql", || Some(record(1)));
        let nginx = cache.get_or_load("nginx", || Some(record(2)));
        assert_eq!(nginx, Some(record(2)));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn invalidate_forces_reload() {
        let cache = RecordCache::new();
        cache.get_or_load("mysql", || None);

        assert!(cache.invalidate("mysql"));
        assert_eq!(cache.get_or_load("mysql", || Some(record(1))), Some(record(1)));

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn clones_share_entries() {
        let cache = RecordCache::new();
        assert!(!cache.is_shared());

        let shared = cache.clone();
        assert!(cache.is_shared());
        shared.get_or_load("mysql", || Some(record(1)));
        assert!(cache.contains("mysql"));
    }

    #[test]
    fn shared_cache_loads_once_across_threads() {
        let cache = RecordCache::new();
        let calls = Arc::new(Mutex::new(0));

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let cache = cache.clone();
                let calls = Arc::clone(&calls);
                scope.spawn(move || {
                    cache.get_or_load("mysql", || {
                        *calls.lock().unwrap() += 1;
                        Some(record(3307))
                    })
                });
            }
        });

        assert_eq!(*calls.lock().unwrap(), 1);
    }
}
