use crate::crypto::hash::Hash;
use crate::trie::error::{TrieError, TrieResult};
use crate::trie::mpt::MerklePatriciaTrie;
use crate::trie::node::Node;

impl MerklePatriciaTrie {
    /// Walk the subtree under `root`, checking per-type invariants
    ///
    /// Every referenced node must load. Branches need a child or a value,
    /// extensions a non-empty path and exactly one child. Stops at the first
    /// violation.
    pub fn validate_structure(&self, root: Option<&Hash>) -> TrieResult<()> {
        let root = root.ok_or_else(|| TrieError::structural("expected non-empty root"))?;
        let node = self.nodes.load_node(root)?;
        self.validate_node(&node)
    }

    fn validate_node(&self, node: &Node) -> TrieResult<()> {
        match node {
            Node::Branch(branch) => {
                if branch.child_count() == 0 && branch.value().is_none() {
                    return Err(TrieError::structural("branch node has neither children nor a value"));
                }
                for (_, child) in self.nodes.load_children(node)? {
                    self.validate_node(&child)?;
                }
                Ok(())
            },
            Node::Extension(ext) => {
                if ext.path().is_empty() {
                    return Err(TrieError::structural("extension node has an empty path"));
                }
                let mut children = self.nodes.load_children(node)?;
                match children.pop() {
                    Some((_, child)) if children.is_empty() => self.validate_node(&child),
                    _ => Err(TrieError::structural("expected 1 child for extension node")),
                }
            },
            Node::Leaf(_) => Ok(()),
        }
    }
}
