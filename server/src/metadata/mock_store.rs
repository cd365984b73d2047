//! Mock implementation of MetadataStorage trait for testing

use crate::metadata::{BlobRecord, MetadataStorage};
use crate::naming::DataKey;
use actix_web::Error;
use actix_web::error::{ErrorBadRequest, ErrorInternalServerError, ErrorNotFound};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Mock implementation of MetadataStorage for testing
pub struct MockMetadataStore {
    data: Arc<Mutex<HashMap<DataKey, BlobRecord>>>,
}

impl MockMetadataStore {
    /// Create a new mock metadata store
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<DataKey, BlobRecord>>, Error> {
        self.data.lock().map_err(|_| ErrorInternalServerError("Mock index lock poisoned"))
    }

    /// Clear all data from the store (useful for test cleanup)
    pub fn clear(&self) {
        if let Ok(mut data) = self.lock() {
            data.clear();
        }
    }

    /// Get the number of records in the store
    pub fn object_count(&self) -> usize {
        self.lock().map(|data| data.len()).unwrap_or(0)
    }
}

impl Default for MockMetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataStorage for MockMetadataStore {
    fn put_metadata(&self, record: &BlobRecord) -> Result<(), Error> {
        let mut data = self.lock()?;
        if data.contains_key(&record.data_key) {
            return Err(ErrorBadRequest("Key already exists"));
        }
        data.insert(record.data_key.clone(), record.clone());
        Ok(())
    }

    fn get_metadata(&self, data_key: &str) -> Result<BlobRecord, Error> {
        self.lock()?
            .get(data_key)
            .cloned()
            .ok_or_else(|| ErrorNotFound(format!("No data found for key: {}", data_key)))
    }

    fn object_exists(&self, data_key: &str) -> Result<bool, Error> {
        Ok(self.lock()?.contains_key(data_key))
    }

    fn list_metadata(&self) -> Result<Vec<BlobRecord>, Error> {
        Ok(self.lock()?.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_metadata_store_basic_operations() {
        let store = MockMetadataStore::new();
        let record = BlobRecord::new("key1", "match.json", "key1__match.json", b"{}");

        assert_eq!(store.object_count(), 0);

        store.put_metadata(&record).unwrap();
        assert_eq!(store.object_count(), 1);

        // Duplicate key should fail
        assert!(store.put_metadata(&record).is_err());

        assert!(store.object_exists("key1").unwrap());
        assert!(!store.object_exists("nonexistent").unwrap());
        assert_eq!(store.get_metadata("key1").unwrap(), record);
        assert_eq!(store.list_metadata().unwrap(), vec![record]);

        store.clear();
        assert_eq!(store.object_count(), 0);
        assert!(store.get_metadata("key1").is_err());
    }
}
