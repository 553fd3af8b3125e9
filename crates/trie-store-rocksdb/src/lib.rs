//! # trie-store-rocksdb
//!
//! A persistent [`trie_store::NodeStore`] backed by RocksDB, for when
//! trie nodes must outlive the process. The core crate's in-memory store
//! is the distilled spec's minimal requirement; this crate is the answer
//! to "durable, and shareable across trie instances opened against the
//! same path" (§6.4, §11).
//!
//! Column-family isolation, Snappy compression, and a tunable block
//! cache are lifted from the workspace's existing RocksDB storage
//! adapter, applied here to a single `nodes` column family keyed by
//! 32-byte hash.

use std::path::Path;

use rocksdb::{ColumnFamilyDescriptor, Options, WriteBatch, DB};
use tracing::{debug, warn};

use trie_store::{NodeStore, TrieError};

const CF_NODES: &str = "nodes";

/// RocksDB tuning knobs for the node store (§10.3).
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Path to the database directory.
    pub path: String,
    /// Block cache size in bytes (default: 256MB).
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 64MB).
    pub write_buffer_size: usize,
    /// Maximum number of write buffers (default: 3).
    pub max_write_buffer_number: i32,
    /// Enable fsync after each write (default: true for durability).
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: "./data/trie".to_string(),
            block_cache_size: 256 * 1024 * 1024,
            write_buffer_size: 64 * 1024 * 1024,
            max_write_buffer_number: 3,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// A config tuned for tests: small buffers, no fsync.
    pub fn for_testing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 8 * 1024 * 1024,
            write_buffer_size: 4 * 1024 * 1024,
            max_write_buffer_number: 2,
            sync_writes: false,
        }
    }
}

/// A [`NodeStore`] backed by a single-column-family RocksDB instance.
pub struct RocksDbNodeStore {
    db: DB,
    config: RocksDbConfig,
}

impl RocksDbNodeStore {
    /// Open or create the database at `config.path`.
    pub fn open(config: RocksDbConfig) -> Result<Self, TrieError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_max_write_buffer_number(config.max_write_buffer_number);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&rocksdb::Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let mut cf_opts = Options::default();
        cf_opts.set_compression_type(rocksdb::DBCompressionType::Snappy);
        let cf_descriptors = vec![ColumnFamilyDescriptor::new(CF_NODES, cf_opts)];

        let db = DB::open_cf_descriptors(&opts, &config.path, cf_descriptors)
            .map_err(|e| TrieError::Store(format!("failed to open RocksDB at {}: {e}", config.path)))?;

        debug!(path = %config.path, "opened rocksdb node store");
        Ok(Self { db, config })
    }

    fn cf(&self) -> &rocksdb::ColumnFamily {
        self.db
            .cf_handle(CF_NODES)
            .expect("nodes column family created at open")
    }
}

impl Drop for RocksDbNodeStore {
    fn drop(&mut self) {
        debug!(path = %self.config.path, "closing rocksdb node store");
    }
}

impl NodeStore for RocksDbNodeStore {
    fn get(&self, hash: &[u8; 32]) -> Result<Option<Vec<u8>>, TrieError> {
        self.db
            .get_cf(self.cf(), hash)
            .map_err(|e| TrieError::Store(format!("rocksdb get failed: {e}")))
    }

    fn put(&self, hash: [u8; 32], data: Vec<u8>) -> Result<(), TrieError> {
        let mut write_opts = rocksdb::WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        self.db
            .put_cf_opt(self.cf(), hash, &data, &write_opts)
            .map_err(|e| TrieError::Store(format!("rocksdb put failed: {e}")))
    }

    fn put_batch(&self, entries: Vec<([u8; 32], Vec<u8>)>) -> Result<(), TrieError> {
        let mut batch = WriteBatch::default();
        for (hash, data) in &entries {
            batch.put_cf(self.cf(), hash, data);
        }
        let mut write_opts = rocksdb::WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        self.db
            .write_opt(batch, &write_opts)
            .map_err(|e| TrieError::Store(format!("rocksdb batch write failed: {e}")))
    }

    fn delete(&self, hash: &[u8; 32]) -> Result<(), TrieError> {
        match self.db.delete_cf(self.cf(), hash) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(error = %e, "rocksdb delete failed");
                Err(TrieError::Store(format!("rocksdb delete failed: {e}")))
            }
        }
    }
}

/// Open `path` as a node store rooted there, creating it if absent.
pub fn open(path: impl AsRef<Path>) -> Result<RocksDbNodeStore, TrieError> {
    RocksDbNodeStore::open(RocksDbConfig {
        path: path.as_ref().to_string_lossy().to_string(),
        ..RocksDbConfig::default()
    })
}
