use log::trace;

use crate::crypto::hash::{short_hex, Hash};
use crate::trie::encode::{common_prefix_len, nibbles_to_hex, Nibble};
use crate::trie::error::{TrieError, TrieResult};
use crate::trie::mpt::MerklePatriciaTrie;
use crate::trie::node::{BranchNode, Node};
use crate::trie::path::{PathEntry, TriePath};

impl MerklePatriciaTrie {
    /// Insert or update `value` under the nibble path `key`
    ///
    /// `path` is the traversal result for `key` and `matched` the number of
    /// nibbles it matched. The deepest node is replaced by the new structure,
    /// then every node on the path is re-persisted bottom-up. Returns the new
    /// root hash; the caller decides whether to adopt it.
    pub(crate) fn upsert(
        &self,
        key: &[Nibble],
        value: Vec<u8>,
        matched: usize,
        path: &mut TriePath,
    ) -> TrieResult<Hash> {
        let Some(last) = path.pop() else {
            // Empty trie: the whole key goes into a single leaf
            path.push(PathEntry::new(Node::leaf(key.to_vec(), value), 0));
            return self.persist_path(key, path);
        };

        let pos = last.pos;
        let remaining = key.get(pos..).ok_or_else(|| {
            TrieError::Structural(format!("match position {} beyond key of {} nibbles", pos, key.len()))
        })?;

        match last.node {
            Node::Leaf(mut leaf)
                if matched == key.len()
                    && common_prefix_len(leaf.path(), remaining) == leaf.path().len() =>
            {
                leaf.set_value(value);
                path.push(PathEntry::new(Node::Leaf(leaf), pos));
            },
            Node::Branch(mut branch) => match remaining.first() {
                None => {
                    branch.set_value(value);
                    path.push(PathEntry::new(Node::Branch(branch), pos));
                },
                Some(&nibble) => {
                    if branch.child(nibble).is_some() {
                        return Err(TrieError::Structural(format!(
                            "branch slot {:x} already occupied at position {}",
                            nibble, pos
                        )));
                    }
                    path.push(PathEntry::new(Node::Branch(branch), pos));
                    path.push(PathEntry::new(Node::leaf(remaining[1..].to_vec(), value), pos + 1));
                },
            },
            node => self.split(node, pos, remaining, value, path)?,
        }

        self.persist_path(key, path)
    }

    /// Split an extension or leaf whose path diverges from the key
    ///
    /// The shared prefix (if any) becomes a new extension above a new branch;
    /// the old node hangs off the branch under its first diverging nibble and
    /// the new value goes under the key's diverging nibble, or into the branch
    /// itself when the key ends at the divergence point.
    fn split(
        &self,
        node: Node,
        pos: usize,
        remaining: &[Nibble],
        value: Vec<u8>,
        path: &mut TriePath,
    ) -> TrieResult<()> {
        let node_path = node
            .path()
            .ok_or_else(|| TrieError::Structural(format!("unexpected {} node on split", node.node_type().as_str())))?
            .to_vec();
        let cpl = common_prefix_len(&node_path, remaining);

        if cpl == node_path.len() && cpl == remaining.len() {
            return Err(TrieError::Structural(format!(
                "{} path {} fully matches the key, nothing to split",
                node.node_type().as_str(),
                nibbles_to_hex(&node_path)
            )));
        }

        trace!(
            "Splitting {} {} against {} at {}",
            node.node_type().as_str(),
            nibbles_to_hex(&node_path),
            nibbles_to_hex(remaining),
            cpl
        );

        if cpl > 0 {
            path.push(PathEntry::new(Node::extension(node_path[..cpl].to_vec(), None), pos));
        }

        let mut branch = BranchNode::new();

        if cpl == node_path.len() {
            // Only a leaf can end before the key does; its value moves into the branch
            match node {
                Node::Leaf(leaf) => branch.set_value(leaf.into_value()),
                other => {
                    return Err(TrieError::Structural(format!(
                        "{} node ended inside the key without matching it",
                        other.node_type().as_str()
                    )))
                },
            }
        } else {
            let slot = node_path[cpl];
            let rest = node_path[cpl + 1..].to_vec();
            let hash = match node {
                Node::Extension(ext) if rest.is_empty() => *ext
                    .child()
                    .ok_or_else(|| TrieError::structural("extension node without child"))?,
                mut shrunk => {
                    shrunk.set_path(rest)?;
                    self.nodes.put_node(&shrunk)?
                },
            };
            branch.set_child(slot, hash);
        }

        let branch_pos = pos + cpl;
        if cpl == remaining.len() {
            branch.set_value(value);
            path.push(PathEntry::new(Node::Branch(branch), branch_pos));
        } else {
            path.push(PathEntry::new(Node::Branch(branch), branch_pos));
            path.push(PathEntry::new(Node::leaf(remaining[cpl + 1..].to_vec(), value), branch_pos + 1));
        }

        Ok(())
    }

    /// Persist every node on `path`, deepest first
    ///
    /// Each parent is linked to its child's final hash before it is encoded,
    /// so the root is written last. Returns the root hash.
    fn persist_path(&self, key: &[Nibble], path: &mut TriePath) -> TrieResult<Hash> {
        let mut child_hash: Option<Hash> = None;

        for entry in path.entries_mut().iter_mut().rev() {
            if let Some(child) = child_hash {
                match &mut entry.node {
                    Node::Branch(branch) => {
                        let nibble = *key.get(entry.pos).ok_or_else(|| {
                            TrieError::Structural(format!(
                                "invalid branch position {} for key of {} nibbles",
                                entry.pos,
                                key.len()
                            ))
                        })?;
                        branch.set_child(nibble, child);
                    },
                    Node::Extension(ext) => ext.set_child(child),
                    Node::Leaf(_) => return Err(TrieError::structural("leaf node cannot have a child")),
                }
            }

            let hash = self.nodes.put_node(&entry.node)?;
            trace!("Persisted {} {} at {}", entry.node.node_type().as_str(), short_hex(&hash), entry.pos);
            entry.hash = Some(hash);
            child_hash = Some(hash);
        }

        child_hash.ok_or_else(|| TrieError::structural("nothing to persist on an empty path"))
    }
}
