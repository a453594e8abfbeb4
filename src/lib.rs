// vibetrie - authenticated key-value storage on a Merkle Patricia Trie
//
// Keys map to values through a content-addressed trie whose root hash commits
// to the whole key-value set. Nodes and long values live in pluggable KV stores.

pub mod config;
pub mod crypto;
pub mod storage;
pub mod trie;

pub use crypto::hash::Hash;
pub use storage::{KVStore, KVStoreError, MemoryStore, RocksDBStore};
pub use trie::{MerklePatriciaTrie, Node, TrieError, TrieResult};

// Initialize logging
pub fn init_logger() {
    env_logger::init();
}

/// Initialize logging with a default filter, still overridable through `RUST_LOG`.
///
/// Repeated initialization is ignored.
pub fn init_logger_with_level(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env).try_init();
}
