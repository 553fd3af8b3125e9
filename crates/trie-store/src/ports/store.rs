use std::sync::Arc;

use crate::domain::errors::TrieError;
use crate::domain::hash::Hash;

/// Content-addressed storage for trie nodes (§4.3, §6.4).
///
/// A `NodeStore` maps a node's digest to its RLP encoding. Implementations
/// are free to be in-memory, file-backed, or a full LSM-tree engine; the
/// trie engine never assumes anything about durability or concurrency
/// beyond `Send + Sync`.
pub trait NodeStore: Send + Sync {
    /// Fetch the encoding stored under `hash`, or `None` if absent.
    fn get(&self, hash: &Hash) -> Result<Option<Vec<u8>>, TrieError>;

    /// Store `data` under `hash`. Storing the same `(hash, data)` pair
    /// twice is a no-op, not an error - callers never need to check
    /// existence before writing.
    fn put(&self, hash: Hash, data: Vec<u8>) -> Result<(), TrieError>;

    /// Store several `(hash, data)` pairs as a single unit of work where
    /// the backing engine supports it.
    fn put_batch(&self, entries: Vec<(Hash, Vec<u8>)>) -> Result<(), TrieError> {
        for (hash, data) in entries {
            self.put(hash, data)?;
        }
        Ok(())
    }

    /// Remove the node stored under `hash`, if present. Deleting an
    /// absent hash is a no-op, not an error.
    fn delete(&self, hash: &Hash) -> Result<(), TrieError>;
}

/// Lets an already-boxed store be wrapped again (e.g. by
/// [`crate::adapters::CachedNodeStore`]) without unwrapping the `Arc`.
impl NodeStore for Arc<dyn NodeStore> {
    fn get(&self, hash: &Hash) -> Result<Option<Vec<u8>>, TrieError> {
        (**self).get(hash)
    }

    fn put(&self, hash: Hash, data: Vec<u8>) -> Result<(), TrieError> {
        (**self).put(hash, data)
    }

    fn put_batch(&self, entries: Vec<(Hash, Vec<u8>)>) -> Result<(), TrieError> {
        (**self).put_batch(entries)
    }

    fn delete(&self, hash: &Hash) -> Result<(), TrieError> {
        (**self).delete(hash)
    }
}
