use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use crate::domain::errors::TrieError;
use crate::domain::hash::Hash;
use crate::ports::NodeStore;

/// Wraps any [`NodeStore`] with an in-process LRU cache of node bytes
/// (§10.3, §11 "one in-process LRU node cache"). Content-addressing
/// makes this safe: a hash never refers to two different encodings, so
/// the cache never needs invalidation, only eviction.
pub struct CachedNodeStore<S: NodeStore> {
    inner: S,
    cache: Mutex<LruCache<Hash, Vec<u8>>>,
}

impl<S: NodeStore> CachedNodeStore<S> {
    pub fn new(inner: S, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity.max(1) is never zero");
        Self { inner, cache: Mutex::new(LruCache::new(capacity)) }
    }
}

impl<S: NodeStore> NodeStore for CachedNodeStore<S> {
    fn get(&self, hash: &Hash) -> Result<Option<Vec<u8>>, TrieError> {
        if let Some(hit) = self.cache.lock().map_err(|_| TrieError::LockPoisoned)?.get(hash) {
            return Ok(Some(hit.clone()));
        }
        let value = self.inner.get(hash)?;
        if let Some(ref bytes) = value {
            self.cache
                .lock()
                .map_err(|_| TrieError::LockPoisoned)?
                .put(*hash, bytes.clone());
        }
        Ok(value)
    }

    fn put(&self, hash: Hash, data: Vec<u8>) -> Result<(), TrieError> {
        self.inner.put(hash, data.clone())?;
        self.cache.lock().map_err(|_| TrieError::LockPoisoned)?.put(hash, data);
        Ok(())
    }

    fn put_batch(&self, entries: Vec<(Hash, Vec<u8>)>) -> Result<(), TrieError> {
        self.inner.put_batch(entries.clone())?;
        let mut cache = self.cache.lock().map_err(|_| TrieError::LockPoisoned)?;
        for (hash, data) in entries {
            cache.put(hash, data);
        }
        Ok(())
    }

    fn delete(&self, hash: &Hash) -> Result<(), TrieError> {
        self.inner.delete(hash)?;
        self.cache.lock().map_err(|_| TrieError::LockPoisoned)?.pop(hash);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryNodeStore;

    #[test]
    fn caches_repeated_reads() {
        let store = CachedNodeStore::new(InMemoryNodeStore::new(), 4);
        let hash = [1u8; 32];
        store.put(hash, vec![9, 9]).unwrap();
        assert_eq!(store.get(&hash).unwrap(), Some(vec![9, 9]));
        assert_eq!(store.get(&hash).unwrap(), Some(vec![9, 9]));
    }

    #[test]
    fn eviction_falls_back_to_inner_store() {
        let store = CachedNodeStore::new(InMemoryNodeStore::new(), 1);
        let a = [1u8; 32];
        let b = [2u8; 32];
        store.put(a, vec![1]).unwrap();
        store.put(b, vec![2]).unwrap();
        // `a` was evicted from the LRU cache but is still durable in `inner`.
        assert_eq!(store.get(&a).unwrap(), Some(vec![1]));
    }

    #[test]
    fn delete_clears_cache_and_inner() {
        let store = CachedNodeStore::new(InMemoryNodeStore::new(), 4);
        let hash = [3u8; 32];
        store.put(hash, vec![7]).unwrap();
        store.delete(&hash).unwrap();
        assert_eq!(store.get(&hash).unwrap(), None);
    }
}
