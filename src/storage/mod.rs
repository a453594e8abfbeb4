// Storage module for vibetrie
// Byte-oriented key-value backends used to persist trie nodes and long values

pub mod kv_store;
pub mod memory_store;

// Re-export main components
pub use kv_store::{KVStore, KVStoreError, RocksDBStore};
pub use memory_store::MemoryStore;
