//! Persistent node store adapter
//!
//! Nodes and long values are content-addressed: the sha-256 of the stored
//! bytes is the storage key, so entries are written once and never updated.

use std::sync::Arc;

use log::trace;

use crate::crypto::hash::{sha256, short_hex, Hash};
use crate::storage::KVStore;
use crate::trie::encode::Nibble;
use crate::trie::error::{TrieError, TrieResult};
use crate::trie::node::Node;

/// Loads and stores serialized trie nodes keyed by their hash
#[derive(Clone)]
pub struct NodeStore {
    store: Arc<dyn KVStore>,
}

impl NodeStore {
    pub fn new(store: Arc<dyn KVStore>) -> Self {
        Self { store }
    }

    /// Serialize, hash and store a node, returning its content address
    pub fn put_node(&self, node: &Node) -> TrieResult<Hash> {
        let bytes = node.encode()?;
        let hash = sha256(&bytes);

        if !self.store.exists(&hash)? {
            self.store.put(&hash, &bytes)?;
            trace!("Stored {} node {}", node.node_type().as_str(), short_hex(&hash));
        }

        Ok(hash)
    }

    /// Load the node stored under `hash`
    pub fn load_node(&self, hash: &Hash) -> TrieResult<Node> {
        match self.store.get(hash)? {
            Some(bytes) => Node::decode(&bytes),
            None => Err(TrieError::MissingNode(hex::encode(hash))),
        }
    }

    /// Materialize the immediate children of `node`
    pub fn load_children(&self, node: &Node) -> TrieResult<Vec<(Option<Nibble>, Node)>> {
        node.child_refs()
            .into_iter()
            .map(|(nibble, hash)| self.load_node(&hash).map(|child| (nibble, child)))
            .collect()
    }

    pub fn flush(&self) -> TrieResult<()> {
        Ok(self.store.flush()?)
    }
}

/// Side store for values too long to inline in the trie
#[derive(Clone)]
pub struct ValueStore {
    store: Arc<dyn KVStore>,
}

impl ValueStore {
    pub fn new(store: Arc<dyn KVStore>) -> Self {
        Self { store }
    }

    /// Store a value under its sha-256 and return that reference
    pub fn put_value(&self, value: &[u8]) -> TrieResult<Hash> {
        let hash = sha256(value);

        if !self.store.exists(&hash)? {
            self.store.put(&hash, value)?;
            trace!("Stored {} byte value {}", value.len(), short_hex(&hash));
        }

        Ok(hash)
    }

    pub fn get_value(&self, hash: &Hash) -> TrieResult<Option<Vec<u8>>> {
        Ok(self.store.get(hash)?)
    }

    pub fn flush(&self) -> TrieResult<()> {
        Ok(self.store.flush()?)
    }
}
