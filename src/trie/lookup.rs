use log::trace;

use crate::crypto::hash::{short_hex, Hash};
use crate::trie::encode::Nibble;
use crate::trie::error::{TrieError, TrieResult};
use crate::trie::mpt::MerklePatriciaTrie;
use crate::trie::node::Node;
use crate::trie::path::{PathEntry, TriePath};

/// Raw result of walking a nibble path from the root
#[derive(Debug)]
pub(crate) struct Traversal {
    /// Inline value or indirect reference held by the terminal node
    pub stored: Option<Vec<u8>>,
    pub path: TriePath,
    pub matched: usize,
}

enum Step {
    Done(Option<Vec<u8>>, usize),
    Descend(Hash, usize),
}

impl MerklePatriciaTrie {
    /// Walk `key` from the root, recording every visited node
    pub(crate) fn find_value(&self, key: &[Nibble]) -> TrieResult<Traversal> {
        let mut path = TriePath::new();

        let (stored, matched) = match self.root_hash() {
            Some(root) => self.find_at(root, key, 0, &mut path)?,
            None => (None, 0),
        };

        Ok(Traversal { stored, path, matched })
    }

    /// Helper function to resolve a key from the node stored under `hash`
    ///
    /// `pos` is the number of key nibbles already matched.
    fn find_at(
        &self,
        hash: Hash,
        key: &[Nibble],
        pos: usize,
        path: &mut TriePath,
    ) -> TrieResult<(Option<Vec<u8>>, usize)> {
        let node = self.nodes.load_node(&hash)?;
        let remaining = key.get(pos..).ok_or_else(|| {
            TrieError::Structural(format!("match position {} beyond key of {} nibbles", pos, key.len()))
        })?;

        let step = match &node {
            Node::Branch(branch) => match remaining.first() {
                // The key ends here: the branch's own value is the answer
                None => Step::Done(branch.value().map(<[u8]>::to_vec), pos),
                Some(&nibble) => match branch.child(nibble) {
                    Some(child) => Step::Descend(*child, pos + 1),
                    None => Step::Done(None, pos),
                },
            },
            Node::Extension(ext) => {
                if remaining.starts_with(ext.path()) {
                    let child = ext
                        .child()
                        .ok_or_else(|| TrieError::structural("extension node without child"))?;
                    Step::Descend(*child, pos + ext.path().len())
                } else {
                    Step::Done(None, pos)
                }
            },
            Node::Leaf(leaf) => {
                if leaf.path() == remaining {
                    Step::Done(Some(leaf.value().to_vec()), key.len())
                } else {
                    Step::Done(None, pos)
                }
            },
        };

        trace!("Visited {} {} at {}", node.node_type().as_str(), short_hex(&hash), pos);
        path.push(PathEntry::stored(node, hash, pos));

        match step {
            Step::Done(stored, matched) => Ok((stored, matched)),
            Step::Descend(child, next) => self.find_at(child, key, next, path),
        }
    }
}
