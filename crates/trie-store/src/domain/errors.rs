//! # Core Error Types
//!
//! Defines every error condition raised by the byte codec, the RLP codec,
//! and the trie engine. Each variant is recoverable - no panics occur in
//! production code.

use thiserror::Error;

/// Errors raised by the core codec and trie engine.
///
/// All errors are recoverable. None of these cause panics.
#[derive(Debug, Error)]
pub enum TrieError {
    /// A negative integer was passed to the RLP encoder.
    #[error("cannot RLP-encode a negative integer")]
    EncodeNegative,

    /// RLP decode saw a prefix byte >= 192 reserved for future list forms.
    #[error("unsupported RLP prefix byte: {0}")]
    UnsupportedPrefix(u8),

    /// RLP decode ran off the end of the buffer mid-item.
    #[error("truncated RLP buffer: expected {expected} more byte(s) at offset {offset}")]
    Truncated { offset: usize, expected: usize },

    /// A top-level RLP decode left unread trailing bytes.
    #[error("{0} unread byte(s) remain after decoding the top-level RLP item")]
    ExtraBytes(usize),

    /// The trie walked to a non-empty node reference absent from the store.
    #[error("node missing from store: {0}")]
    NodeMissing(String),

    /// `encode_path`/`decode_path` received a nibble value outside `0..=16`.
    #[error("nibble out of range: {0} (must be 0..=16)")]
    BadNibble(u8),

    /// A decoded RLP item did not have the shape expected for a trie node.
    #[error("malformed trie node: expected 2 or 17 RLP items, got {0}")]
    MalformedNode(usize),

    /// The underlying node store reported a failure.
    #[error("node store error: {0}")]
    Store(String),

    /// A key exceeded `TrieConfig::max_key_len` before it ever reached
    /// the trie engine.
    #[error("key of {len} byte(s) exceeds the configured maximum of {max}")]
    KeyTooLong { len: usize, max: usize },

    /// A `NodeStore`-backed RwLock/Mutex was poisoned by a prior panic.
    #[error("node store lock poisoned")]
    LockPoisoned,
}
