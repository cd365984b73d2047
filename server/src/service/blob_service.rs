//! Blob service joining the storage directory and the metadata index

use crate::metadata::{BlobRecord, MetadataStorage};
use crate::naming::{self, CONTENT_TYPE};
use crate::storage::Storage;
use std::collections::HashMap;
use std::sync::Arc;
use actix_web::Error;
use actix_web::error::ErrorNotFound;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};

/// One entry of the `/files` listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FileEntry {
    pub file_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: String,
}

/// A data key resolved to the stored file holding its content
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBlob {
    pub file_name: String,
    /// Present when the blob was uploaded through the index
    pub record: Option<BlobRecord>,
}

/// Blob service that owns the storage backend and the metadata index
pub struct BlobService {
    storage: Arc<dyn Storage>,
    metadata: Arc<dyn MetadataStorage>,
}

impl BlobService {
    /// Create a new blob service with injected backends
    pub fn new(storage: Arc<dyn Storage>, metadata: Arc<dyn MetadataStorage>) -> Self {
        Self { storage, metadata }
    }

    /// Store a new blob and return its index record
    pub fn upload(&self, supplied_name: Option<&str>, data: &[u8]) -> Result<BlobRecord, Error> {
        let data_key = naming::generate_data_key();
        let name = naming::sanitize_name(supplied_name);
        let file_name = naming::compose_file_name(&data_key, &name);

        self.storage.put_object(&file_name, data)?;

        let record = BlobRecord::new(&data_key, &name, &file_name, data);
        self.metadata.put_metadata(&record).map_err(|e| {
            // The blob stays reachable through the file name fallback
            error!("Failed to index {} for key {}: {}", file_name, data_key, e);
            e
        })?;

        info!("Uploaded {} bytes as key {} ({})", record.size, data_key, name);
        Ok(record)
    }

    /// Find the stored file for a data key.
    ///
    /// Looks at the index first, then the legacy `<key>.json` file, then any
    /// `<key>__*` file written without an index record.
    pub fn resolve(&self, data_key: &str) -> Result<Option<ResolvedBlob>, Error> {
        if !naming::is_valid_data_key(data_key) {
            debug!("Rejecting malformed data key {:?}", data_key);
            return Ok(None);
        }

        if self.metadata.object_exists(data_key)? {
            let record = self.metadata.get_metadata(data_key)?;
            return Ok(Some(ResolvedBlob { file_name: record.file_name.clone(), record: Some(record) }));
        }

        let legacy = naming::legacy_file_name(data_key);
        if self.storage.object_exists(&legacy)? {
            debug!("Resolved key {} to legacy file {}", data_key, legacy);
            return Ok(Some(ResolvedBlob { file_name: legacy, record: None }));
        }

        let prefix = naming::file_name_prefix(data_key);
        let unindexed = self.storage.list_objects()?
            .into_iter()
            .filter(|file_name| file_name.starts_with(&prefix))
            .min();

        Ok(unindexed.map(|file_name| {
            debug!("Resolved key {} to unindexed file {}", data_key, file_name);
            ResolvedBlob { file_name, record: None }
        }))
    }

    /// Read the content stored under a data key
    pub fn download(&self, data_key: &str) -> Result<(ResolvedBlob, Vec<u8>), Error> {
        let resolved = self.resolve(data_key)?
            .ok_or_else(|| ErrorNotFound("Not found"))?;
        let data = self.storage.get_object(&resolved.file_name)?;

        info!("Serving {} bytes for key {} from {}", data.len(), data_key, resolved.file_name);
        Ok((resolved, data))
    }

    /// Describe every stored blob exactly once
    pub fn list(&self) -> Result<Vec<FileEntry>, Error> {
        let indexed: HashMap<String, BlobRecord> = self.metadata.list_metadata()?
            .into_iter()
            .map(|record| (record.file_name.clone(), record))
            .collect();

        let files = self.storage.list_objects()?
            .into_iter()
            .map(|file_name| {
                let (file_id, name) = match indexed.get(&file_name) {
                    Some(record) => (record.data_key.clone(), record.name.clone()),
                    None => naming::parse_file_name(&file_name),
                };
                FileEntry { file_id, name, file_type: CONTENT_TYPE.to_string() }
            })
            .collect::<Vec<_>>();

        debug!("Listing {} stored files ({} indexed)", files.len(), indexed.len());
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::mock_store::MockMetadataStore;
    use crate::storage::local_store::LocalDirStore;
    use crate::storage::mock_store::MockBlobStore;
    use std::collections::HashSet;
    use std::fs;

    fn mock_service() -> BlobService {
        BlobService::new(Arc::new(MockBlobStore::new()), Arc::new(MockMetadataStore::new()))
    }

    #[test]
    fn test_upload_then_download_round_trips() {
        let service = mock_service();
        let payload = br#"{"frames":[{"t":0},{"t":16}]}"#;

        let record = service.upload(Some("match.json"), payload).unwrap();
        assert_eq!(record.data_key.len(), 32);
        assert_eq!(record.file_name, format!("{}__match.json", record.data_key));

        let (resolved, data) = service.download(&record.data_key).unwrap();
        assert_eq!(data, payload);
        assert_eq!(resolved.record, Some(record));
    }

    #[test]
    fn test_upload_uses_default_name() {
        let service = mock_service();
        let record = service.upload(None, b"{}").unwrap();
        assert_eq!(record.name, "replay.json");
    }

    #[test]
    fn test_upload_sanitizes_name() {
        let service = mock_service();
        let record = service.upload(Some("a/b\\c.json"), b"{}").unwrap();
        assert_eq!(record.name, "a_b_c.json");
        assert!(!record.file_name.contains('/'));
    }

    #[test]
    fn test_download_unknown_key_is_not_found() {
        let service = mock_service();
        let err = service.download("0123456789abcdef0123456789abcdef").unwrap_err();
        assert_eq!(err.as_response_error().status_code(), actix_web::http::StatusCode::NOT_FOUND);
        assert!(service.list().unwrap().is_empty());
    }

    #[test]
    fn test_resolves_legacy_and_unindexed_files() {
        let dir = tempfile::tempdir().unwrap();
        let service = BlobService::new(
            Arc::new(LocalDirStore::new(dir.path()).unwrap()),
            Arc::new(MockMetadataStore::new()),
        );
        fs::write(dir.path().join("oldkey.json"), b"legacy").unwrap();
        fs::write(dir.path().join("newkey__copied.json"), b"copied").unwrap();

        let (legacy, data) = service.download("oldkey").unwrap();
        assert_eq!(legacy.file_name, "oldkey.json");
        assert_eq!(data, b"legacy");

        let (unindexed, data) = service.download("newkey").unwrap();
        assert_eq!(unindexed.file_name, "newkey__copied.json");
        assert!(unindexed.record.is_none());
        assert_eq!(data, b"copied");
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = dir.path().join("storage");
        let service = BlobService::new(
            Arc::new(LocalDirStore::new(&storage).unwrap()),
            Arc::new(MockMetadataStore::new()),
        );
        fs::write(dir.path().join("secret.json"), b"outside").unwrap();

        assert_eq!(service.resolve("../secret").unwrap(), None);
        assert!(service.download("..").is_err());
    }

    #[test]
    fn test_list_mixes_indexed_and_legacy_entries() {
        let dir = tempfile::tempdir().unwrap();
        let service = BlobService::new(
            Arc::new(LocalDirStore::new(dir.path()).unwrap()),
            Arc::new(MockMetadataStore::new()),
        );
        let record = service.upload(Some("run__3.json"), b"{}").unwrap();
        fs::write(dir.path().join("oldkey.json"), b"{}").unwrap();
        fs::write(dir.path().join("handkey__manual.json"), b"{}").unwrap();

        let files: HashSet<FileEntry> = service.list().unwrap().into_iter().collect();
        let entry = |file_id: &str, name: &str| FileEntry {
            file_id: file_id.to_string(),
            name: name.to_string(),
            file_type: "application/json".to_string(),
        };
        let expected: HashSet<FileEntry> = [
            entry(&record.data_key, "run__3.json"),
            entry("oldkey", "oldkey.json"),
            entry("handkey", "manual.json"),
        ]
        .into_iter()
        .collect();

        assert_eq!(files, expected);
    }
}
