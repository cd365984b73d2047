//! Blob Storage Layer Abstraction
//!
//! This module provides an abstraction over blob storage backends. Every
//! blob is a single immutable object addressed by its stored file name, so
//! higher-level services never build filesystem paths themselves.

pub mod local_store;
pub mod mock_store;


use actix_web::Error;
use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};
use local_store::LocalDirStore;
use mock_store::MockBlobStore;

/// Stored file name type
pub type FileName = String;

/// Trait defining the blob storage interface
pub trait Storage: Send + Sync {
    /// Store a new object. Readers never observe partial content.
    fn put_object(&self, file_name: &str, data: &[u8]) -> Result<(), Error>;

    /// Retrieve the full content of an object
    fn get_object(&self, file_name: &str) -> Result<Vec<u8>, Error>;

    /// Check if an object exists
    fn object_exists(&self, file_name: &str) -> Result<bool, Error>;

    /// List the file names of every stored object, in no particular order
    fn list_objects(&self) -> Result<Vec<FileName>, Error>;
}

/// Create a storage instance based on the configuration
pub fn create_store(config: &StorageConfig) -> std::io::Result<Arc<dyn Storage>> {
    match config.backend {
        StorageBackend::Local => Ok(Arc::new(LocalDirStore::new(&config.base_path)?)),
        StorageBackend::Mock => Ok(Arc::new(MockBlobStore::new())),
    }
}
