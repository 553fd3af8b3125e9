use super::errors::TrieError;
use super::hash::{digest, empty_trie_root, Hash};
use super::nibbles::Nibbles;
use super::rlp::{self, RlpItem};

/// The two node shapes that make up the trie (§3.1).
///
/// A 2-element node is either a `Leaf` (its path ended in the terminator
/// and its payload is a user value) or an `Extension` (its payload is a
/// reference to a child node) - `Leaf`/`Extension` are kept as distinct
/// Rust variants for type safety even though the wire shape is the same.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrieNode {
    /// The empty subtree. Hashes to [`empty_trie_root`].
    Empty,

    /// `[encode_path(path, terminated=true), value]`.
    Leaf { path: Nibbles, value: Vec<u8> },

    /// `[encode_path(path, terminated=false), child]`.
    Extension { path: Nibbles, child: Hash },

    /// `[c0, .., c15, value]`: 16 child slots plus a value at this prefix.
    Branch {
        children: Box<[Option<Hash>; 16]>,
        value: Option<Vec<u8>>,
    },
}

fn hash_item(hash: Option<&Hash>) -> RlpItem {
    match hash {
        Some(h) => RlpItem::Bytes(h.to_vec()),
        None => RlpItem::Bytes(Vec::new()),
    }
}

/// Interpret a byte slice as a node reference, failing if it is not
/// exactly 32 bytes.
pub fn hash_from_bytes(bytes: &[u8]) -> Result<Hash, TrieError> {
    if bytes.len() != 32 {
        return Err(TrieError::MalformedNode(bytes.len()));
    }
    let mut hash = [0u8; 32];
    hash.copy_from_slice(bytes);
    Ok(hash)
}

impl TrieNode {
    /// Build the 2-element node shape for `path`/`payload`: the shape
    /// (leaf vs. extension) is derived entirely from whether `path` ends
    /// in the terminator, never from the caller's intent - this is what
    /// lets a single `insert`/`delete` routine treat leaf values and
    /// extension child references as interchangeable opaque payloads
    /// (§4.5.2, §4.5.3).
    pub fn two_element(path: Nibbles, payload: Vec<u8>) -> Result<Self, TrieError> {
        if path.0.last() == Some(&16) {
            Ok(TrieNode::Leaf { path, value: payload })
        } else {
            let child = hash_from_bytes(&payload)?;
            Ok(TrieNode::Extension { path, child })
        }
    }

    /// Decompose a 2-element node into its path and raw payload bytes.
    /// Panics (via `debug_assert`) if called on `Empty`/`Branch` - callers
    /// are expected to have already matched on the node shape.
    pub fn path_and_payload(&self) -> (Nibbles, Vec<u8>) {
        match self {
            TrieNode::Leaf { path, value } => (path.clone(), value.clone()),
            TrieNode::Extension { path, child } => (path.clone(), child.to_vec()),
            _ => unreachable!("path_and_payload called on a non-2-element node"),
        }
    }

    /// RLP-encode this node (§4.5, node shapes).
    pub fn rlp_encode(&self) -> Result<Vec<u8>, TrieError> {
        let item = match self {
            TrieNode::Empty => RlpItem::Bytes(Vec::new()),

            TrieNode::Leaf { path, value } => {
                let mut leaf_path = path.clone();
                if leaf_path.0.last() != Some(&16) {
                    leaf_path.0.push(16);
                }
                let encoded_path = leaf_path.encode_path()?;
                RlpItem::List(vec![
                    RlpItem::Bytes(encoded_path),
                    RlpItem::Bytes(value.clone()),
                ])
            }

            TrieNode::Extension { path, child } => {
                let encoded_path = path.encode_path()?;
                RlpItem::List(vec![
                    RlpItem::Bytes(encoded_path),
                    RlpItem::Bytes(child.to_vec()),
                ])
            }

            TrieNode::Branch { children, value } => {
                let mut items: Vec<RlpItem> = children.iter().map(|c| hash_item(c.as_ref())).collect();
                items.push(match value {
                    Some(v) => RlpItem::Bytes(v.clone()),
                    None => RlpItem::Bytes(Vec::new()),
                });
                RlpItem::List(items)
            }
        };
        Ok(rlp::encode(&item))
    }

    /// Hash of this node's RLP encoding, or [`empty_trie_root`] for `Empty`.
    pub fn hash(&self) -> Result<Hash, TrieError> {
        if matches!(self, TrieNode::Empty) {
            return Ok(empty_trie_root());
        }
        let encoded = self.rlp_encode()?;
        Ok(digest(&encoded))
    }

    /// Decode a node from its RLP encoding (inverse of [`rlp_encode`]),
    /// used when loading a node fetched from a [`crate::ports::NodeStore`].
    pub fn from_rlp(bytes: &[u8]) -> Result<Self, TrieError> {
        let item = rlp::decode(bytes)?;
        match item {
            RlpItem::Bytes(b) if b.is_empty() => Ok(TrieNode::Empty),
            RlpItem::List(items) if items.len() == 2 => {
                let encoded_path = items[0]
                    .as_bytes()
                    .ok_or(TrieError::MalformedNode(items.len()))?;
                let payload = items[1]
                    .as_bytes()
                    .ok_or(TrieError::MalformedNode(items.len()))?;
                let (path, terminated) = Nibbles::decode_path(encoded_path);
                if terminated {
                    Ok(TrieNode::Leaf {
                        path,
                        value: payload.to_vec(),
                    })
                } else {
                    let mut child = [0u8; 32];
                    if payload.len() != 32 {
                        return Err(TrieError::MalformedNode(payload.len()));
                    }
                    child.copy_from_slice(payload);
                    Ok(TrieNode::Extension { path, child })
                }
            }
            RlpItem::List(items) if items.len() == 17 => {
                let mut children: Box<[Option<Hash>; 16]> = Box::new(Default::default());
                for (i, child) in items[..16].iter().enumerate() {
                    let bytes = child.as_bytes().ok_or(TrieError::MalformedNode(17))?;
                    children[i] = if bytes.is_empty() {
                        None
                    } else if bytes.len() == 32 {
                        let mut h = [0u8; 32];
                        h.copy_from_slice(bytes);
                        Some(h)
                    } else {
                        return Err(TrieError::MalformedNode(17));
                    };
                }
                let value = items[16]
                    .as_bytes()
                    .ok_or(TrieError::MalformedNode(17))?
                    .to_vec();
                let value = if value.is_empty() { None } else { Some(value) };
                Ok(TrieNode::Branch { children, value })
            }
            RlpItem::List(items) => Err(TrieError::MalformedNode(items.len())),
            RlpItem::Bytes(_) | RlpItem::Integer(_) => Err(TrieError::MalformedNode(0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_node_hashes_to_empty_trie_root() {
        assert_eq!(TrieNode::Empty.hash().unwrap(), empty_trie_root());
    }

    #[test]
    fn leaf_round_trips_through_rlp() {
        let leaf = TrieNode::Leaf {
            path: Nibbles(vec![1, 2, 3, 4, 16]),
            value: vec![0xAB, 0xCD],
        };
        let encoded = leaf.rlp_encode().unwrap();
        let decoded = TrieNode::from_rlp(&encoded).unwrap();
        assert_eq!(decoded, leaf);
    }

    #[test]
    fn extension_round_trips_through_rlp() {
        let ext = TrieNode::Extension {
            path: Nibbles(vec![1, 2, 3]),
            child: [7u8; 32],
        };
        let encoded = ext.rlp_encode().unwrap();
        let decoded = TrieNode::from_rlp(&encoded).unwrap();
        assert_eq!(decoded, ext);
    }

    #[test]
    fn branch_round_trips_through_rlp() {
        let mut children: Box<[Option<Hash>; 16]> = Box::new(Default::default());
        children[3] = Some([9u8; 32]);
        children[15] = Some([1u8; 32]);
        let branch = TrieNode::Branch {
            children,
            value: Some(vec![0x01]),
        };
        let encoded = branch.rlp_encode().unwrap();
        let decoded = TrieNode::from_rlp(&encoded).unwrap();
        assert_eq!(decoded, branch);
    }

    #[test]
    fn two_element_picks_shape_from_terminator() {
        let leaf = TrieNode::two_element(Nibbles(vec![1, 2, 16]), vec![0xFF]).unwrap();
        assert!(matches!(leaf, TrieNode::Leaf { .. }));

        let ext = TrieNode::two_element(Nibbles(vec![1, 2]), vec![3u8; 32]).unwrap();
        assert!(matches!(ext, TrieNode::Extension { .. }));
    }

    #[test]
    fn two_element_rejects_non_32_byte_extension_payload() {
        let err = TrieNode::two_element(Nibbles(vec![1, 2]), vec![3u8; 10]).unwrap_err();
        assert!(matches!(err, TrieError::MalformedNode(10)));
    }

    #[test]
    fn path_and_payload_round_trips_with_two_element() {
        let leaf = TrieNode::two_element(Nibbles(vec![1, 2, 16]), vec![0xFF]).unwrap();
        let (path, payload) = leaf.path_and_payload();
        assert_eq!(path.0, vec![1, 2, 16]);
        assert_eq!(payload, vec![0xFF]);
    }

    #[test]
    fn same_node_hashes_deterministically() {
        let leaf = TrieNode::Leaf {
            path: Nibbles(vec![1, 2, 3, 4, 16]),
            value: vec![0xAB, 0xCD],
        };
        assert_eq!(leaf.hash().unwrap(), leaf.hash().unwrap());
    }
}
