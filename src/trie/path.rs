use crate::crypto::hash::Hash;
use crate::trie::node::Node;

/// A node visited during traversal
#[derive(Debug, Clone, PartialEq)]
pub struct PathEntry {
    /// The node as loaded from, or about to be written to, the node store
    pub node: Node,
    /// Content address, `None` until the node is (re)persisted
    pub hash: Option<Hash>,
    /// Key nibbles already matched when this node was reached
    pub pos: usize,
}

impl PathEntry {
    /// Entry for a node that has not been persisted yet
    pub fn new(node: Node, pos: usize) -> Self {
        Self { node, hash: None, pos }
    }

    /// Entry for a node loaded from the store under `hash`
    pub fn stored(node: Node, hash: Hash, pos: usize) -> Self {
        Self { node, hash: Some(hash), pos }
    }
}

/// Nodes from the root down to the deepest node reached for a key
///
/// Produced by a lookup and consumed by an upsert; never stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriePath {
    entries: Vec<PathEntry>,
}

impl TriePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: PathEntry) {
        self.entries.push(entry);
    }

    pub fn pop(&mut self) -> Option<PathEntry> {
        self.entries.pop()
    }

    /// Deepest node on the path
    pub fn last(&self) -> Option<&PathEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in root-first order
    pub fn entries(&self) -> &[PathEntry] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [PathEntry] {
        &mut self.entries
    }

    /// Hash of the first entry, once persisted
    pub fn root_hash(&self) -> Option<Hash> {
        self.entries.first().and_then(|entry| entry.hash)
    }
}
