use std::sync::Arc;

use log::{debug, info};

use crate::crypto::hash::{hash_from_slice, short_hex, Hash};
use crate::storage::{KVStore, MemoryStore};
use crate::trie::encode::{bytes_to_nibbles, nibbles_to_hex, Nibble};
use crate::trie::error::{TrieError, TrieResult};
use crate::trie::node::Node;
use crate::trie::path::TriePath;
use crate::trie::store::{NodeStore, ValueStore};

/// Values up to this many bytes are stored inline in the trie; longer values
/// live in the value store and the trie holds their sha-256.
pub const MAX_INLINE_VALUE_LEN: usize = 32;

/// Outcome of resolving a key against the trie
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lookup {
    /// The user value, with indirect references resolved
    pub value: Option<Vec<u8>>,
    /// The value exactly as held by the trie node (inline bytes or a reference)
    pub stored: Option<Vec<u8>>,
    /// Nodes visited from the root, deepest last
    pub path: TriePath,
    /// Key nibbles matched along the path
    pub matched: usize,
}

/// Merkle Patricia Trie over content-addressed node and value stores
///
/// The root hash is the only mutable state; it is replaced once a put has
/// persisted every node on its path. A single writer per handle is assumed.
pub struct MerklePatriciaTrie {
    pub(super) nodes: NodeStore,
    pub(super) values: ValueStore,
    root: Option<Hash>,
}

impl MerklePatriciaTrie {
    /// Create a new empty trie on top of the given stores
    pub fn new(nodes: Arc<dyn KVStore>, values: Arc<dyn KVStore>) -> Self {
        Self {
            nodes: NodeStore::new(nodes),
            values: ValueStore::new(values),
            root: None,
        }
    }

    /// Create a new empty trie that lives only in memory
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// Open a previously persisted trie by its root hash
    pub fn open(nodes: Arc<dyn KVStore>, values: Arc<dyn KVStore>, root: Hash) -> TrieResult<Self> {
        let mut trie = Self::new(nodes, values);
        trie.nodes.load_node(&root)?;
        trie.root = Some(root);
        info!("Opened trie at root {}", hex::encode(root));
        Ok(trie)
    }

    /// Get the root hash of the trie, `None` while it is empty
    pub fn root_hash(&self) -> Option<Hash> {
        self.root
    }

    /// Load the root node
    pub fn root_node(&self) -> TrieResult<Option<Node>> {
        self.root.map(|hash| self.nodes.load_node(&hash)).transpose()
    }

    /// Get the value stored for `key`
    pub fn get(&self, key: &[u8]) -> TrieResult<Option<Vec<u8>>> {
        Ok(self.lookup(key)?.value)
    }

    /// Resolve `key`, also returning the visited path
    pub fn lookup(&self, key: &[u8]) -> TrieResult<Lookup> {
        if key.is_empty() {
            return Ok(Lookup::default());
        }

        let nibbles = bytes_to_nibbles(key);
        debug!("Get {}", nibbles_to_hex(&nibbles));

        let traversal = self.find_value(&nibbles)?;
        let value = match &traversal.stored {
            Some(stored) => Some(self.resolve_value(stored)?),
            None => {
                debug!("No value for {}", hex::encode(key));
                None
            },
        };

        Ok(Lookup {
            value,
            stored: traversal.stored,
            path: traversal.path,
            matched: traversal.matched,
        })
    }

    /// Insert or update `key` with `value`
    ///
    /// Empty keys and empty values are rejected before the trie is touched.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> TrieResult<()> {
        if key.is_empty() || value.is_empty() {
            return Err(TrieError::InvalidUserData);
        }

        let Lookup { value: existing, mut path, matched, .. } = self.lookup(key)?;
        if existing.as_deref() == Some(value) {
            debug!("Value already stored for {}", hex::encode(key));
            return Ok(());
        }

        let user_value = if value.len() > MAX_INLINE_VALUE_LEN {
            self.values.put_value(value)?.to_vec()
        } else {
            value.to_vec()
        };

        debug!("Inserting {} byte value for {}", value.len(), hex::encode(key));
        let root = self.upsert(&bytes_to_nibbles(key), user_value, matched, &mut path)?;

        self.root = Some(root);
        debug!("New root {}", hex::encode(root));
        Ok(())
    }

    /// Validate the structure of the whole trie
    pub fn validate(&self) -> TrieResult<()> {
        self.validate_structure(self.root.as_ref())
    }

    /// Flush both backing stores
    pub fn flush(&self) -> TrieResult<()> {
        self.nodes.flush()?;
        self.values.flush()
    }

    /// Render the trie one node per line, children indented under parents
    pub fn dump(&self) -> TrieResult<String> {
        let mut out = String::new();
        match self.root {
            Some(root) => self.dump_node(&root, None, 0, &mut out)?,
            None => out.push_str("<empty>\n"),
        }
        Ok(out)
    }

    fn dump_node(&self, hash: &Hash, slot: Option<Nibble>, depth: usize, out: &mut String) -> TrieResult<()> {
        let node = self.nodes.load_node(hash)?;

        out.push_str(&"  ".repeat(depth));
        if let Some(nibble) = slot {
            out.push_str(&format!("[{:x}] ", nibble));
        }
        out.push_str(&format!("{} {}", node.node_type().as_str(), short_hex(hash)));
        if let Some(path) = node.path() {
            out.push_str(&format!(" path={}", nibbles_to_hex(path)));
        }
        if let Some(value) = node.value() {
            out.push_str(&format!(" value={}", hex::encode(value)));
        }
        out.push('\n');

        for (nibble, child) in node.child_refs() {
            self.dump_node(&child, nibble, depth + 1, out)?;
        }
        Ok(())
    }

    /// Turn a stored value back into the user value
    ///
    /// A 32-byte value may be a reference into the value store. When the value
    /// store has nothing under it, the stored bytes are returned unchanged.
    fn resolve_value(&self, stored: &[u8]) -> TrieResult<Vec<u8>> {
        let Some(reference) = hash_from_slice(stored) else {
            return Ok(stored.to_vec());
        };

        match self.values.get_value(&reference)? {
            Some(value) => Ok(value),
            None => {
                debug!("No indirect value under {}, returning stored bytes", short_hex(&reference));
                Ok(stored.to_vec())
            },
        }
    }
}
