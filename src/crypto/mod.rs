// Content addressing for trie nodes and indirect values

pub mod hash;

pub use hash::{sha256, Hash, HASH_LEN};
