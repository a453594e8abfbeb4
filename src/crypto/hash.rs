use sha2::{Sha256, Digest};

/// Type alias for a 32-byte hash
pub type Hash = [u8; 32];

/// Length in bytes of a content address
pub const HASH_LEN: usize = 32;

/// Compute SHA-256 hash of data
pub fn sha256(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Interpret a byte slice as a hash, if it has exactly the right length
pub fn hash_from_slice(bytes: &[u8]) -> Option<Hash> {
    if bytes.len() != HASH_LEN {
        return None;
    }

    let mut hash = [0u8; HASH_LEN];
    hash.copy_from_slice(bytes);
    Some(hash)
}

/// Short hex prefix of a hash, for log lines and dumps
pub fn short_hex(hash: &Hash) -> String {
    hex::encode(&hash[..4])
}
