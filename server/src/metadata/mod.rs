//! Metadata Index Abstraction
//!
//! The index maps each data key to the stored file holding its content,
//! so downloads never have to guess a file name. Blobs without a record
//! (legacy files) are still reachable through the file naming fallback.

pub mod sqlite_store;
pub mod mock_store;


use actix_web::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{MetadataBackend, MetadataConfig, StorageConfig};
use crate::naming::{DataKey, CONTENT_TYPE};
use mock_store::MockMetadataStore;
use sqlite_store::SQLiteMetadataStore;

/// Index entry describing one uploaded blob
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlobRecord {
    /// Identifier returned to the uploader
    pub data_key: DataKey,
    /// Sanitized client-supplied file name
    pub name: String,
    /// Name of the stored file inside the storage directory
    pub file_name: String,
    /// Content type served on download
    pub content_type: String,
    /// Content length in bytes
    pub size: u64,
    /// Hex MD5 digest of the content
    pub checksum: String,
    /// Upload time
    pub created_at: DateTime<Utc>,
}

impl BlobRecord {
    /// Describe freshly uploaded content
    pub fn new(data_key: &str, name: &str, file_name: &str, data: &[u8]) -> Self {
        Self {
            data_key: data_key.to_string(),
            name: name.to_string(),
            file_name: file_name.to_string(),
            content_type: CONTENT_TYPE.to_string(),
            size: data.len() as u64,
            checksum: format!("{:x}", md5::compute(data)),
            created_at: Utc::now(),
        }
    }
}

/// Trait defining the metadata index interface
pub trait MetadataStorage: Send + Sync {
    /// Store the record for a new data key. Existing keys are rejected.
    fn put_metadata(&self, record: &BlobRecord) -> Result<(), Error>;

    /// Retrieve the record for a data key
    fn get_metadata(&self, data_key: &str) -> Result<BlobRecord, Error>;

    /// Check if a data key has a record
    fn object_exists(&self, data_key: &str) -> Result<bool, Error>;

    /// List every record, in no particular order
    fn list_metadata(&self) -> Result<Vec<BlobRecord>, Error>;
}

/// Create a metadata index based on the configuration
pub fn create_metadata_store(
    config: &MetadataConfig,
    storage: &StorageConfig,
) -> std::io::Result<Arc<dyn MetadataStorage>> {
    match config.backend {
        MetadataBackend::SQLite => {
            let db_path = config.resolve_db_path(storage);
            Ok(Arc::new(SQLiteMetadataStore::open(&db_path, config.wal_mode)?))
        }
        MetadataBackend::Mock => Ok(Arc::new(MockMetadataStore::new())),
    }
}
