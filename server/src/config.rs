//! Application Configuration
//!
//! This module provides configuration management for the application,
//! supporting YAML configuration files with sensible defaults and a few
//! environment overrides for deployment.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use log::{info, warn};

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "REPLAY_CONFIG";
/// Environment variable overriding the shared secret
pub const API_KEY_ENV: &str = "REPLAY_API_KEY";
/// Environment variable overriding the storage directory
pub const STORAGE_DIR_ENV: &str = "REPLAY_STORAGE_DIR";
/// Environment variable overriding the storage backend
pub const STORAGE_BACKEND_ENV: &str = "STORAGE_BACKEND";
/// Environment variable overriding the metadata backend
pub const METADATA_BACKEND_ENV: &str = "METADATA_BACKEND";

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
/// Default index file name inside the storage directory
pub const INDEX_FILE_NAME: &str = ".index.sqlite3";

/// Storage backend types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub enum StorageBackend {
    #[default]
    Local,
    Mock,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "filesystem" | "fs" => Ok(StorageBackend::Local),
            "mock" => Ok(StorageBackend::Mock),
            _ => Err(format!("Unknown storage backend: {}", s))
        }
    }
}

/// Metadata backend types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub enum MetadataBackend {
    #[default]
    SQLite,
    Mock,
}

impl std::str::FromStr for MetadataBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(MetadataBackend::SQLite),
            "mock" => Ok(MetadataBackend::Mock),
            _ => Err(format!("Unknown metadata backend: {}", s))
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// Storage configuration
    pub storage: StorageConfig,
    /// Metadata index configuration
    pub metadata: MetadataConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Number of worker threads
    pub workers: usize,
    /// Maximum accepted upload size in bytes
    pub max_upload_size: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9710,
            workers: 4,
            max_upload_size: 64 * 1024 * 1024, // 64MB
        }
    }
}

/// Authentication configuration
#[derive(Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared secret every request must present. Empty rejects all requests.
    pub api_key: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .finish()
    }
}

/// Blob storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage backend type
    pub backend: StorageBackend,
    /// Directory holding one file per uploaded blob
    pub base_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            base_path: "./storage".to_string(),
        }
    }
}

/// Metadata index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Metadata backend type
    pub backend: MetadataBackend,
    /// Database file path, defaults to a hidden file inside the storage directory
    pub db_path: Option<String>,
    /// Enable WAL mode
    pub wal_mode: bool,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            backend: MetadataBackend::SQLite,
            db_path: None,
            wal_mode: true,
        }
    }
}

impl MetadataConfig {
    /// Resolve the index database location for a storage directory
    pub fn resolve_db_path(&self, storage: &StorageConfig) -> PathBuf {
        match &self.db_path {
            Some(path) => PathBuf::from(path),
            None => Path::new(&storage.base_path).join(INDEX_FILE_NAME),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Path to log4rs configuration file
    pub config_file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            config_file: "server_log.yaml".to_string(),
        }
    }
}

impl AppConfig {
    /// Configuration file path, from the environment or the default
    pub fn config_path() -> PathBuf {
        env::var(CONFIG_PATH_ENV)
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
            .into()
    }

    /// Load configuration from a YAML file, use defaults if not found.
    ///
    /// Runs before logging is set up, so the outcome is left to the caller to report.
    pub fn from_file(config_path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = config_path.as_ref();
        if config_path.exists() {
            let content = fs::read_to_string(config_path)?;
            Ok(serde_yaml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Override file values with deployment environment variables
    pub fn apply_env_overrides(&mut self) {
        if let Ok(api_key) = env::var(API_KEY_ENV) {
            info!("Using API key from environment");
            self.auth.api_key = api_key;
        }

        if let Ok(dir) = env::var(STORAGE_DIR_ENV) {
            info!("Using storage directory from environment: {}", dir);
            self.storage.base_path = dir;
        }

        if let Ok(backend_str) = env::var(STORAGE_BACKEND_ENV) {
            match backend_str.parse::<StorageBackend>() {
                Ok(backend) => {
                    info!("Using storage backend from environment: {:?}", backend);
                    self.storage.backend = backend;
                }
                Err(e) => warn!("Invalid storage backend in environment: {}. Keeping {:?}.", e, self.storage.backend),
            }
        }

        if let Ok(backend_str) = env::var(METADATA_BACKEND_ENV) {
            match backend_str.parse::<MetadataBackend>() {
                Ok(backend) => {
                    info!("Using metadata backend from environment: {:?}", backend);
                    self.metadata.backend = backend;
                }
                Err(e) => warn!("Invalid metadata backend in environment: {}. Keeping {:?}.", e, self.metadata.backend),
            }
        }
    }
}
