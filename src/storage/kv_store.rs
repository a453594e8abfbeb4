use rocksdb::{DB, DBCompressionType, Options};
use std::path::Path;
use log::{debug, error};
use thiserror::Error;

use crate::config::StorageConfig;

/// Error type for KVStore operations
#[derive(Debug, Error)]
pub enum KVStoreError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// RocksDB error
    #[error("RocksDB error: {0}")]
    RocksDBError(String),

    /// Invalid store configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<rocksdb::Error> for KVStoreError {
    fn from(err: rocksdb::Error) -> Self {
        KVStoreError::RocksDBError(err.to_string())
    }
}

/// Key-value store trait
///
/// The trie only ever needs single-key atomicity; multi-key writes are
/// issued one by one.
pub trait KVStore: Send + Sync {
    /// Put a key-value pair
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError>;

    /// Get a value by key
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    /// Delete a key-value pair
    fn delete(&self, key: &[u8]) -> Result<(), KVStoreError>;

    /// Check if a key exists
    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError>;

    /// Flush any pending writes to disk
    fn flush(&self) -> Result<(), KVStoreError>;
}

/// RocksDB implementation of KVStore
pub struct RocksDBStore {
    /// RocksDB instance
    db: DB,
}

impl RocksDBStore {
    /// Create a new RocksDBStore
    pub fn new(path: &Path) -> Result<Self, KVStoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        Self::with_options(path, opts)
    }

    /// Create a new RocksDBStore with custom options
    pub fn with_options(path: &Path, options: Options) -> Result<Self, KVStoreError> {
        let db = DB::open(&options, path).map_err(|e| {
            error!("Failed to open RocksDB at {:?}: {}", path, e);
            KVStoreError::RocksDBError(format!("Failed to open RocksDB: {}", e))
        })?;
        debug!("Opened RocksDB at {:?}", path);
        Ok(Self { db })
    }

    /// Create a new RocksDBStore tuned by the storage configuration
    pub fn with_config(path: &Path, config: &StorageConfig) -> Result<Self, KVStoreError> {
        if config.create_if_missing {
            std::fs::create_dir_all(path)?;
        }

        let mut opts = Options::default();
        opts.create_if_missing(config.create_if_missing);
        opts.set_max_open_files(config.max_open_files);
        opts.set_write_buffer_size(config.write_buffer_size * 1024 * 1024);

        let compression = if config.enable_compression {
            compression_type(&config.compression_type)?
        } else {
            DBCompressionType::None
        };
        opts.set_compression_type(compression);

        Self::with_options(path, opts)
    }
}

/// Map a configured compression name onto the RocksDB codec
fn compression_type(name: &str) -> Result<DBCompressionType, KVStoreError> {
    match name.to_ascii_lowercase().as_str() {
        "none" => Ok(DBCompressionType::None),
        "snappy" => Ok(DBCompressionType::Snappy),
        "lz4" => Ok(DBCompressionType::Lz4),
        "zstd" => Ok(DBCompressionType::Zstd),
        "zlib" => Ok(DBCompressionType::Zlib),
        other => Err(KVStoreError::InvalidConfig(format!("unknown compression type: {}", other))),
    }
}

impl KVStore for RocksDBStore {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        self.db.put(key, value)
            .map_err(|e| KVStoreError::RocksDBError(format!("Failed to put key: {}", e)))
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        self.db.get(key)
            .map_err(|e| KVStoreError::RocksDBError(format!("Failed to get key: {}", e)))
    }

    fn delete(&self, key: &[u8]) -> Result<(), KVStoreError> {
        self.db.delete(key)
            .map_err(|e| KVStoreError::RocksDBError(format!("Failed to delete key: {}", e)))
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        Ok(self.db.get_pinned(key)?.is_some())
    }

    fn flush(&self) -> Result<(), KVStoreError> {
        self.db.flush()
            .map_err(|e| KVStoreError::RocksDBError(format!("Failed to flush: {}", e)))
    }
}
