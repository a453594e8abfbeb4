//! Merkle Patricia Trie implementation for vibetrie
//!
//! Keys are expanded to nibble paths and stored in a content-addressed trie of
//! branch, extension and leaf nodes. Every node is persisted under the sha-256
//! of its encoding, so the root hash commits to the entire key-value set.
//!
//! A read walks the trie from the root and records the visited path; a write
//! reuses that path, splices new structure in at its deepest node and
//! re-persists the path bottom-up before swapping the root.

pub mod encode;
pub mod error;
pub mod node;
pub mod path;
pub mod store;
pub mod mpt;

mod lookup;
mod upsert;
mod validate;

// Re-export main components
pub use error::{TrieError, TrieResult};
pub use mpt::{Lookup, MerklePatriciaTrie, MAX_INLINE_VALUE_LEN};
pub use node::{BranchNode, ExtensionNode, LeafNode, Node, NodeType};
pub use path::{PathEntry, TriePath};
pub use store::{NodeStore, ValueStore};
