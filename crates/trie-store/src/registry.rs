//! # Store Registry
//!
//! A process-wide cache of opened [`NodeStore`]s keyed by backing path, so
//! that two `Trie` handles opened against the same file share one store
//! instance instead of racing two independent handles on the same bytes
//! (§4.3, §9 "Global node-store registry").
//!
//! This is deliberately an explicit object rather than module-level
//! state - a caller that wants one registry per process constructs one
//! `StoreRegistry::default()` and shares it via `Arc`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::adapters::CachedNodeStore;
use crate::config::TrieConfig;
use crate::domain::errors::TrieError;
use crate::ports::NodeStore;

/// Caches opened stores by their backing path.
#[derive(Default)]
pub struct StoreRegistry {
    stores: RwLock<HashMap<PathBuf, Arc<dyn NodeStore>>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the store already open for `path`, or open a fresh one via
    /// `open` and remember it. `open` runs at most once per distinct path.
    pub fn get_or_open<F>(&self, path: &Path, open: F) -> Result<Arc<dyn NodeStore>, TrieError>
    where
        F: FnOnce() -> Result<Arc<dyn NodeStore>, TrieError>,
    {
        if let Some(store) = self.stores.read().map_err(|_| TrieError::LockPoisoned)?.get(path) {
            return Ok(store.clone());
        }

        let mut stores = self.stores.write().map_err(|_| TrieError::LockPoisoned)?;
        if let Some(store) = stores.get(path) {
            return Ok(store.clone());
        }

        let store = open()?;
        debug!(path = %path.display(), "opened node store");
        stores.insert(path.to_path_buf(), store.clone());
        Ok(store)
    }

    /// Like [`Self::get_or_open`], but wraps a freshly opened store in a
    /// [`CachedNodeStore`] sized by `config.node_cache_size` before
    /// remembering it. A store already cached for `path` is returned as
    /// opened - the cache size only applies at first open (§10.3).
    pub fn get_or_open_cached<F>(
        &self,
        path: &Path,
        config: &TrieConfig,
        open: F,
    ) -> Result<Arc<dyn NodeStore>, TrieError>
    where
        F: FnOnce() -> Result<Arc<dyn NodeStore>, TrieError>,
    {
        let capacity = config.node_cache_size;
        self.get_or_open(path, || {
            let inner = open()?;
            Ok(Arc::new(CachedNodeStore::new(inner, capacity)) as Arc<dyn NodeStore>)
        })
    }

    /// Drop the cached handle for `path`, if any. The underlying store
    /// itself is only actually closed once every `Arc` clone handed out
    /// earlier is also dropped.
    pub fn close(&self, path: &Path) -> Result<(), TrieError> {
        let mut stores = self.stores.write().map_err(|_| TrieError::LockPoisoned)?;
        stores.remove(path);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.stores.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryNodeStore;
    use std::path::PathBuf;

    #[test]
    fn get_or_open_only_opens_once() {
        let registry = StoreRegistry::new();
        let path = PathBuf::from("/tmp/does-not-matter.db");
        let mut opens = 0;

        for _ in 0..3 {
            opens += 1;
            let store = registry
                .get_or_open(&path, || Ok(Arc::new(InMemoryNodeStore::new())))
                .unwrap();
            let _ = store;
        }
        // the closure runs each loop iteration, but only the first call's
        // result is actually stored - verify indirectly via identity.
        let first = registry
            .get_or_open(&path, || panic!("should not reopen"))
            .unwrap();
        let second = registry
            .get_or_open(&path, || panic!("should not reopen"))
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(opens, 3);
    }

    #[test]
    fn distinct_paths_get_distinct_stores() {
        let registry = StoreRegistry::new();
        let a = registry
            .get_or_open(Path::new("/tmp/a.db"), || Ok(Arc::new(InMemoryNodeStore::new()) as Arc<dyn NodeStore>))
            .unwrap();
        let b = registry
            .get_or_open(Path::new("/tmp/b.db"), || Ok(Arc::new(InMemoryNodeStore::new()) as Arc<dyn NodeStore>))
            .unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn close_forgets_the_cached_handle() {
        let registry = StoreRegistry::new();
        let path = PathBuf::from("/tmp/c.db");
        registry
            .get_or_open(&path, || Ok(Arc::new(InMemoryNodeStore::new())))
            .unwrap();
        assert_eq!(registry.len(), 1);
        registry.close(&path).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn get_or_open_cached_wraps_in_an_lru_cache() {
        let registry = StoreRegistry::new();
        let path = PathBuf::from("/tmp/cached.db");
        let config = TrieConfig { node_cache_size: 4, ..TrieConfig::default() };

        let store = registry
            .get_or_open_cached(&path, &config, || Ok(Arc::new(InMemoryNodeStore::new())))
            .unwrap();

        let hash = [1u8; 32];
        store.put(hash, vec![9, 9]).unwrap();
        assert_eq!(store.get(&hash).unwrap(), Some(vec![9, 9]));

        let reopened = registry
            .get_or_open_cached(&path, &config, || panic!("should not reopen"))
            .unwrap();
        assert!(Arc::ptr_eq(&store, &reopened));
    }
}
