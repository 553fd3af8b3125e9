//! # trie-store
//!
//! A hexary Merkle-Patricia trie: a key-value store keyed by byte strings
//! that exposes a single root digest summarizing its entire contents, and
//! whose internal node layout is fully canonical - two tries built from the
//! same key/value pairs, in any insertion order, always converge to the
//! same root.
//!
//! ## Architecture
//!
//! - `domain`: the trie engine itself (RLP codec, nibble paths, node
//!   shapes, insert/delete/lookup) - pure, with no knowledge of any
//!   storage backend.
//! - `ports`: the `NodeStore` trait the trie engine is built against.
//! - `adapters`: concrete `NodeStore` implementations. This crate ships
//!   an in-memory one; see `trie-store-rocksdb` for a persistent one.
//! - `config`: tunables shared by every adapter (cache sizing, key length
//!   limits).
//! - `registry`: a process-wide cache of opened stores, keyed by backing
//!   path, so repeated opens of the same file share one handle.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod registry;

pub use adapters::{CachedNodeStore, InMemoryNodeStore};
pub use config::TrieConfig;
pub use domain::{MapKey, Trie, TrieError, TrieNode};
pub use ports::NodeStore;
pub use registry::StoreRegistry;
