//! # Trie Engine
//!
//! Recursive insert/delete/lookup over leaf, extension, and branch nodes,
//! maintaining the canonical shape described in §3.3 and exposing a root
//! hash that changes with every mutation (§4.5).

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::TrieConfig;
use crate::ports::NodeStore;

use super::errors::TrieError;
use super::hash::Hash;
use super::nibbles::Nibbles;
use super::node::{hash_from_bytes, TrieNode};

/// A key in [`Trie::to_map`]'s output: either the raw key bytes or their
/// hex encoding, selected by the `as_hex` argument (§6.2).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum MapKey {
    Raw(Vec<u8>),
    Hex(String),
}

/// A hexary Merkle-Patricia trie opened against a [`NodeStore`] and a
/// starting root reference.
///
/// Cloning a `Trie` is cheap (an `Arc` clone and a hash copy); a clone
/// observes the root at clone time and is unaffected by later mutations
/// on the original handle (§9, "ownership of nodes").
#[derive(Clone)]
pub struct Trie {
    store: Arc<dyn NodeStore>,
    root: Option<Hash>,
    config: TrieConfig,
}

impl Trie {
    /// Open a fresh, empty trie against `store`, using the default
    /// [`TrieConfig`].
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self::with_config(store, TrieConfig::default())
    }

    /// Open a trie resuming from a prior root hash, using the default
    /// [`TrieConfig`].
    pub fn open(store: Arc<dyn NodeStore>, root: Option<Hash>) -> Self {
        Self::open_with_config(store, root, TrieConfig::default())
    }

    /// Open a fresh, empty trie against `store`, honoring `config`'s
    /// key-length guard.
    pub fn with_config(store: Arc<dyn NodeStore>, config: TrieConfig) -> Self {
        Self { store, root: None, config }
    }

    /// Open a trie resuming from a prior root hash, honoring `config`'s
    /// key-length guard.
    pub fn open_with_config(store: Arc<dyn NodeStore>, root: Option<Hash>, config: TrieConfig) -> Self {
        Self { store, root, config }
    }

    fn check_key_len(&self, key: &[u8]) -> Result<(), TrieError> {
        if self.config.check_key_len(key) {
            Ok(())
        } else {
            Err(TrieError::KeyTooLong { len: key.len(), max: self.config.max_key_len })
        }
    }

    /// The current root hash, or `None` for the empty trie.
    pub fn root(&self) -> Option<Hash> {
        self.root
    }

    fn load(&self, node_ref: Option<Hash>) -> Result<TrieNode, TrieError> {
        match node_ref {
            None => Ok(TrieNode::Empty),
            Some(hash) => {
                let bytes = self
                    .store
                    .get(&hash)?
                    .ok_or_else(|| TrieError::NodeMissing(hex::encode(hash)))?;
                TrieNode::from_rlp(&bytes)
            }
        }
    }

    fn put(&self, node: &TrieNode) -> Result<Hash, TrieError> {
        let encoded = node.rlp_encode()?;
        let hash = node.hash()?;
        self.store.put(hash, encoded)?;
        Ok(hash)
    }

    /// Fetch the value stored at `key`, or an empty byte string if absent
    /// (§4.5.1, §6.2).
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>, TrieError> {
        self.check_key_len(key)?;
        let nibbles = Nibbles::from_key_bytes(key);
        self.walk(self.root, &nibbles)
    }

    fn walk(&self, node_ref: Option<Hash>, remaining: &Nibbles) -> Result<Vec<u8>, TrieError> {
        let node_ref = match node_ref {
            None => return Ok(Vec::new()),
            Some(h) => h,
        };
        match self.load(Some(node_ref))? {
            TrieNode::Empty => Ok(Vec::new()),
            TrieNode::Leaf { path, value } => {
                if remaining.0 == path.0 {
                    Ok(value)
                } else {
                    Ok(Vec::new())
                }
            }
            TrieNode::Extension { path, child } => {
                if remaining.len() >= path.len() && remaining.0[..path.len()] == path.0[..] {
                    self.walk(Some(child), &remaining.slice(path.len()))
                } else {
                    Ok(Vec::new())
                }
            }
            TrieNode::Branch { children, value } => {
                if remaining.0 == [16] {
                    Ok(value.unwrap_or_default())
                } else if remaining.is_empty() {
                    Ok(Vec::new())
                } else {
                    let nibble = remaining.at(0) as usize;
                    self.walk(children[nibble], &remaining.slice(1))
                }
            }
        }
    }

    /// Insert or delete `key` depending on `value`: an empty `value`
    /// deletes the key (§4.5.2, §4.5.3, §6.2). The root is only replaced
    /// once every child write has succeeded - a failed mutation leaves
    /// `root()` unchanged.
    pub fn update(&mut self, key: &[u8], value: &[u8]) -> Result<(), TrieError> {
        self.check_key_len(key)?;
        let nibbles = Nibbles::from_key_bytes(key);
        if value.is_empty() {
            self.root = self.delete(self.root, &nibbles)?;
        } else {
            self.root = Some(self.insert(self.root, &nibbles, value)?);
        }
        Ok(())
    }

    fn insert(&self, node_ref: Option<Hash>, nibs: &Nibbles, value: &[u8]) -> Result<Hash, TrieError> {
        let node_ref = match node_ref {
            None => {
                let node = TrieNode::two_element(nibs.clone(), value.to_vec())?;
                return self.put(&node);
            }
            Some(h) => h,
        };

        match self.load(Some(node_ref))? {
            TrieNode::Branch { mut children, value: bvalue } => {
                if nibs.0 == [16] {
                    let branch = TrieNode::Branch { children, value: Some(value.to_vec()) };
                    self.put(&branch)
                } else {
                    let slot = nibs.at_checked(0).ok_or(TrieError::MalformedNode(0))? as usize;
                    let child_ref = children[slot];
                    let new_child = self.insert(child_ref, &nibs.slice(1), value)?;
                    children[slot] = Some(new_child);
                    let branch = TrieNode::Branch { children, value: bvalue };
                    self.put(&branch)
                }
            }
            two_element @ (TrieNode::Leaf { .. } | TrieNode::Extension { .. }) => {
                let (k2, v2) = two_element.path_and_payload();

                if nibs.0 == k2.0 {
                    let node = TrieNode::two_element(nibs.clone(), value.to_vec())?;
                    return self.put(&node);
                }

                let i = nibs.common_prefix_len(&k2);
                if i == k2.len() {
                    let child_ref = hash_from_bytes(&v2)?;
                    let new_child = self.insert(Some(child_ref), &nibs.slice(i), value)?;
                    let wrapped = TrieNode::two_element(k2.clone(), new_child.to_vec())?;
                    self.put(&wrapped)
                } else {
                    let a_nibble = nibs.at_checked(i).ok_or(TrieError::MalformedNode(i))?;
                    let b_nibble = k2.at_checked(i).ok_or(TrieError::MalformedNode(i))?;

                    let mut children: Box<[Option<Hash>; 16]> = Box::new(Default::default());
                    let mut branch_value = None;

                    // A nibble of 16 means the key's path ends exactly at this
                    // prefix (it diverges from the other key at its own
                    // terminator) - the payload belongs in the branch's value
                    // slot, not in a child subtree keyed by a nonexistent
                    // 17th nibble.
                    if a_nibble == 16 {
                        branch_value = Some(value.to_vec());
                    } else {
                        let a_hash = self.insert(None, &nibs.slice(i + 1), value)?;
                        children[a_nibble as usize] = Some(a_hash);
                    }

                    if b_nibble == 16 {
                        branch_value = Some(v2.clone());
                    } else {
                        let b_hash = self.insert(None, &k2.slice(i + 1), &v2)?;
                        children[b_nibble as usize] = Some(b_hash);
                    }

                    let branch = TrieNode::Branch { children, value: branch_value };
                    let branch_hash = self.put(&branch)?;

                    if i > 0 {
                        let wrapped = TrieNode::two_element(nibs.slice_range(0, i), branch_hash.to_vec())?;
                        self.put(&wrapped)
                    } else {
                        Ok(branch_hash)
                    }
                }
            }
            TrieNode::Empty => unreachable!("load(Some(_)) never yields Empty"),
        }
    }

    fn delete(&self, node_ref: Option<Hash>, nibs: &Nibbles) -> Result<Option<Hash>, TrieError> {
        let h = match node_ref {
            None => return Ok(None),
            Some(h) => h,
        };

        match self.load(Some(h))? {
            TrieNode::Branch { mut children, value } => {
                if nibs.0 == [16] {
                    self.collapse_branch(children, None)
                } else if nibs.is_empty() {
                    Ok(Some(h))
                } else {
                    let slot = nibs.at_checked(0).ok_or(TrieError::MalformedNode(0))? as usize;
                    let child_ref = children[slot];
                    let new_child = self.delete(child_ref, &nibs.slice(1))?;
                    children[slot] = new_child;
                    self.collapse_branch(children, value)
                }
            }
            two_element @ (TrieNode::Leaf { .. } | TrieNode::Extension { .. }) => {
                let (k2, v2) = two_element.path_and_payload();

                if nibs.0 == k2.0 {
                    return Ok(None);
                }

                let starts_with_path = nibs.len() >= k2.len() && nibs.0[..k2.len()] == k2.0[..];
                if !starts_with_path {
                    return Ok(Some(h));
                }

                let child_ref = hash_from_bytes(&v2)?;
                match self.delete(Some(child_ref), &nibs.slice(k2.len()))? {
                    None => Ok(None),
                    Some(child_hash) => match self.load(Some(child_hash))? {
                        TrieNode::Branch { .. } => {
                            let wrapped = TrieNode::two_element(k2.clone(), child_hash.to_vec())?;
                            Ok(Some(self.put(&wrapped)?))
                        }
                        child_two_element @ (TrieNode::Leaf { .. } | TrieNode::Extension { .. }) => {
                            let (ck, cv) = child_two_element.path_and_payload();
                            let merged_path = Nibbles(k2.0.iter().chain(ck.0.iter()).copied().collect());
                            let merged = TrieNode::two_element(merged_path, cv)?;
                            Ok(Some(self.put(&merged)?))
                        }
                        TrieNode::Empty => unreachable!("load(Some(_)) never yields Empty"),
                    },
                }
            }
            TrieNode::Empty => unreachable!("load(Some(_)) never yields Empty"),
        }
    }

    /// After a branch slot write, collapse to a 2-element node if exactly
    /// one of the 17 slots (16 children plus the value) remains populated,
    /// or to the empty reference if none do (§4.5.3, §9).
    fn collapse_branch(
        &self,
        children: Box<[Option<Hash>; 16]>,
        value: Option<Vec<u8>>,
    ) -> Result<Option<Hash>, TrieError> {
        let populated_children: Vec<usize> =
            children.iter().enumerate().filter_map(|(i, c)| c.map(|_| i)).collect();
        let total_populated = populated_children.len() + usize::from(value.is_some());

        match total_populated {
            0 => Ok(None),
            1 => {
                if let Some(v) = value {
                    let node = TrieNode::two_element(Nibbles(vec![16]), v)?;
                    Ok(Some(self.put(&node)?))
                } else {
                    let slot = populated_children[0];
                    let child_hash = children[slot].expect("slot marked populated");
                    match self.load(Some(child_hash))? {
                        TrieNode::Branch { .. } => {
                            let node = TrieNode::two_element(Nibbles(vec![slot as u8]), child_hash.to_vec())?;
                            Ok(Some(self.put(&node)?))
                        }
                        child_two_element @ (TrieNode::Leaf { .. } | TrieNode::Extension { .. }) => {
                            let (ck, cv) = child_two_element.path_and_payload();
                            let merged_path = Nibbles::prepend(slot as u8, &ck);
                            let node = TrieNode::two_element(merged_path, cv)?;
                            Ok(Some(self.put(&node)?))
                        }
                        TrieNode::Empty => unreachable!("load(Some(_)) never yields Empty"),
                    }
                }
            }
            _ => {
                let node = TrieNode::Branch { children, value };
                Ok(Some(self.put(&node)?))
            }
        }
    }

    /// Count of distinct keys stored (§4.5.4).
    pub fn size(&self) -> Result<usize, TrieError> {
        self.size_of(self.root)
    }

    fn size_of(&self, node_ref: Option<Hash>) -> Result<usize, TrieError> {
        match self.load(node_ref)? {
            TrieNode::Empty => Ok(0),
            TrieNode::Leaf { .. } => Ok(1),
            TrieNode::Extension { child, .. } => self.size_of(Some(child)),
            TrieNode::Branch { children, value } => {
                let mut total = usize::from(value.is_some());
                for child in children.iter() {
                    total += self.size_of(*child)?;
                }
                Ok(total)
            }
        }
    }

    /// The full `key -> value` mapping (§4.5.4, §6.2). Keys are returned
    /// as raw bytes, or as lowercase hex strings if `as_hex` is set.
    pub fn to_map(&self, as_hex: bool) -> Result<BTreeMap<MapKey, Vec<u8>>, TrieError> {
        let mut nibble_map = BTreeMap::new();
        self.collect(self.root, &Nibbles(Vec::new()), &mut nibble_map)?;

        let mut out = BTreeMap::new();
        for (nibble_key, value) in nibble_map {
            let key_bytes = nibbles_to_key_bytes(&nibble_key);
            let key = if as_hex {
                MapKey::Hex(hex::encode(&key_bytes))
            } else {
                MapKey::Raw(key_bytes)
            };
            out.insert(key, value);
        }
        Ok(out)
    }

    fn collect(
        &self,
        node_ref: Option<Hash>,
        prefix: &Nibbles,
        out: &mut BTreeMap<Vec<u8>, Vec<u8>>,
    ) -> Result<(), TrieError> {
        match self.load(node_ref)? {
            TrieNode::Empty => Ok(()),
            TrieNode::Leaf { path, value } => {
                let mut full = prefix.0.clone();
                full.extend_from_slice(&path.0);
                out.insert(full, value);
                Ok(())
            }
            TrieNode::Extension { path, child } => {
                let mut full = prefix.0.clone();
                full.extend_from_slice(&path.0);
                self.collect(Some(child), &Nibbles(full), out)
            }
            TrieNode::Branch { children, value } => {
                if let Some(v) = value {
                    let mut full = prefix.0.clone();
                    full.push(16);
                    out.insert(full, v);
                }
                for (i, child) in children.iter().enumerate() {
                    let mut full = prefix.0.clone();
                    full.push(i as u8);
                    self.collect(*child, &Nibbles(full), out)?;
                }
                Ok(())
            }
        }
    }
}

/// Strip the trailing terminator and pack nibble pairs back into bytes.
fn nibbles_to_key_bytes(nibbles: &[u8]) -> Vec<u8> {
    let body = if nibbles.last() == Some(&16) {
        &nibbles[..nibbles.len() - 1]
    } else {
        nibbles
    };
    Nibbles(body.to_vec()).pack_bytes()
}
