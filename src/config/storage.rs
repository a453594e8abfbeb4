use serde::{Serialize, Deserialize};

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the database holding serialized trie nodes
    pub node_db_path: String,

    /// Path of the database holding values longer than the inline limit
    pub value_db_path: String,

    /// Create the databases if they don't exist
    pub create_if_missing: bool,

    /// Maximum open files
    pub max_open_files: i32,

    /// Write buffer size in MB
    pub write_buffer_size: usize,

    /// Enable compression
    pub enable_compression: bool,

    /// Compression type
    pub compression_type: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            node_db_path: "./data/vibetrie/nodes".to_string(),
            value_db_path: "./data/vibetrie/values".to_string(),
            create_if_missing: true,
            max_open_files: 1000,
            write_buffer_size: 64, // 64MB
            enable_compression: true,
            compression_type: "lz4".to_string(),
        }
    }
}
