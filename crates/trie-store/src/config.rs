//! # Configuration
//!
//! Tunables shared by every [`crate::ports::NodeStore`] adapter, mirroring
//! the workspace's `StateConfig` / `RocksDbConfig` pattern: a handful of
//! production knobs layered on top of an algorithm with no tunables of
//! its own.

/// Knobs for a trie deployment, independent of which [`crate::ports::NodeStore`]
/// backs it.
#[derive(Debug, Clone)]
pub struct TrieConfig {
    /// Capacity of the in-memory LRU cache adapters may keep in front of
    /// their backing store, in number of nodes.
    pub node_cache_size: usize,

    /// Keys longer than this are rejected before they ever reach the
    /// trie engine - a DoS guard against pathologically deep recursion.
    pub max_key_len: usize,
}

impl Default for TrieConfig {
    fn default() -> Self {
        Self {
            node_cache_size: 8192,
            max_key_len: 8192,
        }
    }
}

impl TrieConfig {
    /// A config tuned for tests: small cache, same key-length guard.
    pub fn for_testing() -> Self {
        Self {
            node_cache_size: 64,
            ..Self::default()
        }
    }

    /// Reject `key` if it exceeds [`Self::max_key_len`].
    pub fn check_key_len(&self, key: &[u8]) -> bool {
        key.len() <= self.max_key_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_accepts_ordinary_keys() {
        let config = TrieConfig::default();
        assert!(config.check_key_len(b"dog"));
    }

    #[test]
    fn rejects_keys_past_the_guard() {
        let config = TrieConfig { max_key_len: 4, ..TrieConfig::default() };
        assert!(config.check_key_len(b"dog"));
        assert!(!config.check_key_len(b"doggy"));
    }
}
