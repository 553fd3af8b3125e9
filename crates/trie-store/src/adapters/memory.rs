use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::errors::TrieError;
use crate::domain::hash::Hash;
use crate::ports::NodeStore;

/// In-memory, `HashMap`-backed [`NodeStore`].
///
/// This is the default store for tests and for callers that do not need
/// the nodes to outlive the process; see `trie-store-rocksdb` for a
/// persistent backend.
#[derive(Default)]
pub struct InMemoryNodeStore {
    nodes: RwLock<HashMap<Hash, Vec<u8>>>,
}

impl InMemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes currently held, mainly useful in tests.
    pub fn len(&self) -> usize {
        self.nodes.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NodeStore for InMemoryNodeStore {
    fn get(&self, hash: &Hash) -> Result<Option<Vec<u8>>, TrieError> {
        let nodes = self.nodes.read().map_err(|_| TrieError::LockPoisoned)?;
        Ok(nodes.get(hash).cloned())
    }

    fn put(&self, hash: Hash, data: Vec<u8>) -> Result<(), TrieError> {
        let mut nodes = self.nodes.write().map_err(|_| TrieError::LockPoisoned)?;
        nodes.insert(hash, data);
        Ok(())
    }

    fn put_batch(&self, entries: Vec<(Hash, Vec<u8>)>) -> Result<(), TrieError> {
        let mut nodes = self.nodes.write().map_err(|_| TrieError::LockPoisoned)?;
        nodes.extend(entries);
        Ok(())
    }

    fn delete(&self, hash: &Hash) -> Result<(), TrieError> {
        let mut nodes = self.nodes.write().map_err(|_| TrieError::LockPoisoned)?;
        nodes.remove(hash);
        Ok(())
    }
}
