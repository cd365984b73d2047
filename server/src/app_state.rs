//! Application State Management
//!
//! This module provides the application state that contains all services
//! and their dependencies, following the dependency injection pattern.

use std::sync::Arc;
use log::info;

use crate::config::AppConfig;
use crate::metadata::{create_metadata_store, mock_store::MockMetadataStore};
use crate::service::blob_service::BlobService;
use crate::storage::{create_store, mock_store::MockBlobStore};

/// Application state containing all services and their dependencies
#[derive(Clone)]
pub struct AppState {
    pub blob_service: Arc<BlobService>,
    pub config: AppConfig,
}

impl AppState {
    /// Create application state from configuration
    pub fn from_config(config: AppConfig) -> std::io::Result<Self> {
        info!("Initializing application state with configuration");

        info!("Using {:?} storage backend with base_path: {}",
              config.storage.backend, config.storage.base_path);
        let storage_backend = create_store(&config.storage)?;

        info!("Using {:?} metadata backend", config.metadata.backend);
        let metadata_backend = create_metadata_store(&config.metadata, &config.storage)?;

        let blob_service = Arc::new(BlobService::new(storage_backend, metadata_backend));

        info!("Application state initialized successfully");
        Ok(Self {
            blob_service,
            config,
        })
    }

    /// Create application state for testing with mock backends
    pub fn new_for_testing(api_key: &str) -> Self {
        let mut config = AppConfig::default();
        config.auth.api_key = api_key.to_string();

        let blob_service = Arc::new(BlobService::new(
            Arc::new(MockBlobStore::new()),
            Arc::new(MockMetadataStore::new()),
        ));

        Self {
            blob_service,
            config,
        }
    }
}
