//! # Node Digest
//!
//! The trie is content-addressed: every node is identified by the digest
//! of its RLP encoding. This module fixes the digest algorithm and the
//! canonical empty-trie root.
//!
//! SHA-256 (not Keccak) is the digest here - see `DESIGN.md` for why this
//! diverges from the teacher lineage's Keccak256 choice.

use sha2::{Digest, Sha256};
use std::sync::OnceLock;

use super::rlp::{self, RlpItem};

/// A node reference: the digest of a node's RLP encoding.
pub type Hash = [u8; 32];

/// SHA-256 of `data`.
pub fn digest(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// The root hash of an empty trie: the digest of the RLP encoding of the
/// empty byte string. Computed once and cached; not a compile-time
/// constant since it is derived from the codec rather than hand-copied.
pub fn empty_trie_root() -> Hash {
    static ROOT: OnceLock<Hash> = OnceLock::new();
    *ROOT.get_or_init(|| digest(&rlp::encode(&RlpItem::Bytes(Vec::new()))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_trie_root_is_deterministic() {
        assert_eq!(empty_trie_root(), empty_trie_root());
    }

    #[test]
    fn digest_is_32_bytes_and_deterministic() {
        let a = digest(b"hello");
        let b = digest(b"hello");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert_ne!(a, digest(b"world"));
    }
}
