use thiserror::Error;

use crate::storage::KVStoreError;

/// Error type for trie operations
#[derive(Debug, Error)]
pub enum TrieError {
    /// Put was called with an empty key or an empty value
    #[error("Expected non-empty key and value for user data")]
    InvalidUserData,

    /// Underlying store failure, propagated verbatim
    #[error("KVStore error: {0}")]
    Store(#[from] KVStoreError),

    /// Node bytes could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// A node referenced by hash is absent from the node store
    #[error("Node not found: {0}")]
    MissingNode(String),

    /// The node graph violates a trie invariant
    #[error("Structural error: {0}")]
    Structural(String),
}

/// Result type for trie operations
pub type TrieResult<T> = Result<T, TrieError>;

impl TrieError {
    pub(crate) fn structural(msg: impl Into<String>) -> Self {
        TrieError::Structural(msg.into())
    }
}
