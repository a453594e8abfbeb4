use array_init::array_init;
use serde::{Serialize, Deserialize};

use crate::crypto::hash::{sha256, Hash};
use crate::trie::encode::{compact_decode, compact_encode, Nibble};
use crate::trie::error::{TrieError, TrieResult};

/// Number of child slots in a branch node, one per nibble value
pub const BRANCH_WIDTH: usize = 16;

/// Node kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Branch,
    Extension,
    Leaf,
}

impl NodeType {
    /// Get the node type as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Branch => "branch",
            NodeType::Extension => "extension",
            NodeType::Leaf => "leaf",
        }
    }
}

/// Branch node with up to 16 children and an optional terminal value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchNode {
    children: [Option<Hash>; BRANCH_WIDTH],
    value: Option<Vec<u8>>,
}

impl Default for BranchNode {
    fn default() -> Self {
        Self {
            children: array_init(|_| None),
            value: None,
        }
    }
}

impl BranchNode {
    /// Create a branch with no children and no value
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }

    pub fn set_value(&mut self, value: Vec<u8>) {
        self.value = Some(value);
    }

    /// Child reference stored under `nibble`
    pub fn child(&self, nibble: Nibble) -> Option<&Hash> {
        self.children.get(usize::from(nibble)).and_then(|slot| slot.as_ref())
    }

    /// Point the slot for `nibble` at `hash`. Nibbles are always below 16.
    pub fn set_child(&mut self, nibble: Nibble, hash: Hash) {
        self.children[usize::from(nibble & 0x0F)] = Some(hash);
    }

    /// Occupied slots in nibble order
    pub fn children(&self) -> impl Iterator<Item = (Nibble, &Hash)> + '_ {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|hash| (i as Nibble, hash)))
    }

    pub fn child_count(&self) -> usize {
        self.children.iter().filter(|slot| slot.is_some()).count()
    }
}

/// Extension node compressing a run of single-child branches
///
/// The child is unset only while the node is being assembled by an upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionNode {
    path: Vec<Nibble>,
    child: Option<Hash>,
}

impl ExtensionNode {
    pub fn new(path: Vec<Nibble>, child: Option<Hash>) -> Self {
        Self { path, child }
    }

    pub fn path(&self) -> &[Nibble] {
        &self.path
    }

    pub fn set_path(&mut self, path: Vec<Nibble>) {
        self.path = path;
    }

    pub fn child(&self) -> Option<&Hash> {
        self.child.as_ref()
    }

    pub fn set_child(&mut self, hash: Hash) {
        self.child = Some(hash);
    }
}

/// Leaf node holding the remaining key suffix and the stored value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafNode {
    path: Vec<Nibble>,
    value: Vec<u8>,
}

impl LeafNode {
    pub fn new(path: Vec<Nibble>, value: Vec<u8>) -> Self {
        Self { path, value }
    }

    pub fn path(&self) -> &[Nibble] {
        &self.path
    }

    pub fn set_path(&mut self, path: Vec<Nibble>) {
        self.path = path;
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn set_value(&mut self, value: Vec<u8>) {
        self.value = value;
    }

    pub fn into_value(self) -> Vec<u8> {
        self.value
    }
}

/// Node types in the Merkle Patricia Trie
///
/// Once persisted a node is addressed purely by the sha-256 of its encoding.
/// Children are held as hashes and loaded on demand through a `NodeStore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Branch(BranchNode),
    Extension(ExtensionNode),
    Leaf(LeafNode),
}

impl Node {
    /// Create a new leaf node
    pub fn leaf(path: Vec<Nibble>, value: Vec<u8>) -> Self {
        Node::Leaf(LeafNode::new(path, value))
    }

    /// Create a new extension node
    pub fn extension(path: Vec<Nibble>, child: Option<Hash>) -> Self {
        Node::Extension(ExtensionNode::new(path, child))
    }

    /// Create a new branch node with no children or value
    pub fn branch() -> Self {
        Node::Branch(BranchNode::new())
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Branch(_) => NodeType::Branch,
            Node::Extension(_) => NodeType::Extension,
            Node::Leaf(_) => NodeType::Leaf,
        }
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, Node::Branch(_))
    }

    pub fn is_extension(&self) -> bool {
        matches!(self, Node::Extension(_))
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    /// Nibble path of an extension or leaf
    pub fn path(&self) -> Option<&[Nibble]> {
        match self {
            Node::Extension(ext) => Some(ext.path()),
            Node::Leaf(leaf) => Some(leaf.path()),
            Node::Branch(_) => None,
        }
    }

    pub fn set_path(&mut self, path: Vec<Nibble>) -> TrieResult<()> {
        match self {
            Node::Extension(ext) => ext.set_path(path),
            Node::Leaf(leaf) => leaf.set_path(path),
            Node::Branch(_) => return Err(TrieError::structural("branch nodes carry no path")),
        }
        Ok(())
    }

    /// Terminal value held by a leaf or a branch
    pub fn value(&self) -> Option<&[u8]> {
        match self {
            Node::Branch(branch) => branch.value(),
            Node::Leaf(leaf) => Some(leaf.value()),
            Node::Extension(_) => None,
        }
    }

    pub fn set_value(&mut self, value: Vec<u8>) -> TrieResult<()> {
        match self {
            Node::Branch(branch) => branch.set_value(value),
            Node::Leaf(leaf) => leaf.set_value(value),
            Node::Extension(_) => return Err(TrieError::structural("extension nodes carry no value")),
        }
        Ok(())
    }

    /// Child references with the nibble they hang under (`None` for an extension's child)
    pub fn child_refs(&self) -> Vec<(Option<Nibble>, Hash)> {
        match self {
            Node::Branch(branch) => branch.children().map(|(nibble, hash)| (Some(nibble), *hash)).collect(),
            Node::Extension(ext) => ext.child().map(|hash| (None, *hash)).into_iter().collect(),
            Node::Leaf(_) => Vec::new(),
        }
    }

    /// Serialize the node to bytes
    pub fn encode(&self) -> TrieResult<Vec<u8>> {
        NodeRecord::from(self).encode()
    }

    /// Deserialize a node from bytes
    pub fn decode(bytes: &[u8]) -> TrieResult<Self> {
        let record: NodeRecord = bincode::deserialize(bytes)?;
        Node::try_from(record)
    }

    /// Content address of this node: sha-256 over its encoding
    pub fn hash(&self) -> TrieResult<Hash> {
        Ok(sha256(&self.encode()?))
    }
}

/// Stored form of a node
///
/// Paths are compact-encoded. Extensions keep a list of child hashes so that a
/// malformed record is representable and rejected when decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) enum NodeRecord {
    Branch {
        children: [Option<Hash>; BRANCH_WIDTH],
        value: Option<Vec<u8>>,
    },
    Extension {
        path: Vec<u8>,
        children: Vec<Hash>,
    },
    Leaf {
        path: Vec<u8>,
        value: Vec<u8>,
    },
}

impl NodeRecord {
    pub(crate) fn encode(&self) -> TrieResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }
}

impl From<&Node> for NodeRecord {
    fn from(node: &Node) -> Self {
        match node {
            Node::Branch(branch) => NodeRecord::Branch {
                children: branch.children,
                value: branch.value.clone(),
            },
            Node::Extension(ext) => NodeRecord::Extension {
                path: compact_encode(&ext.path, false),
                children: ext.child.into_iter().collect(),
            },
            Node::Leaf(leaf) => NodeRecord::Leaf {
                path: compact_encode(&leaf.path, true),
                value: leaf.value.clone(),
            },
        }
    }
}

impl TryFrom<NodeRecord> for Node {
    type Error = TrieError;

    fn try_from(record: NodeRecord) -> TrieResult<Self> {
        match record {
            NodeRecord::Branch { children, value } => Ok(Node::Branch(BranchNode { children, value })),
            NodeRecord::Extension { path, children } => {
                let (path, is_leaf) = compact_decode(&path);
                if is_leaf {
                    return Err(TrieError::structural("extension path carries the leaf flag"));
                }
                match children.as_slice() {
                    [child] => Ok(Node::extension(path, Some(*child))),
                    _ => Err(TrieError::Structural(format!(
                        "expected 1 child for extension node, found {}",
                        children.len()
                    ))),
                }
            },
            NodeRecord::Leaf { path, value } => {
                let (path, is_leaf) = compact_decode(&path);
                if !is_leaf {
                    return Err(TrieError::structural("leaf path is missing the leaf flag"));
                }
                Ok(Node::leaf(path, value))
            },
        }
    }
}
