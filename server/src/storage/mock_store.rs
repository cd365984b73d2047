//! Mock implementation of Storage trait for testing

use crate::storage::{FileName, Storage};
use actix_web::Error;
use actix_web::error::{ErrorBadRequest, ErrorInternalServerError, ErrorNotFound};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use log::info;

/// Mock implementation of Storage for testing
pub struct MockBlobStore {
    // In-memory storage: file_name -> data
    data: Arc<Mutex<HashMap<FileName, Vec<u8>>>>,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<FileName, Vec<u8>>>, Error> {
        self.data.lock().map_err(|_| ErrorInternalServerError("Mock store lock poisoned"))
    }

    /// Get the number of stored objects
    pub fn object_count(&self) -> usize {
        self.lock().map(|data| data.len()).unwrap_or(0)
    }

    /// Clear all data from the store
    pub fn clear(&self) {
        if let Ok(mut data) = self.lock() {
            data.clear();
        }
    }
}

impl Default for MockBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MockBlobStore {
    fn put_object(&self, file_name: &str, data: &[u8]) -> Result<(), Error> {
        let mut store = self.lock()?;
        if store.contains_key(file_name) {
            return Err(ErrorBadRequest("Object already exists"));
        }
        store.insert(file_name.to_string(), data.to_vec());
        info!("Mock: Stored {} bytes as {}", data.len(), file_name);
        Ok(())
    }

    fn get_object(&self, file_name: &str) -> Result<Vec<u8>, Error> {
        self.lock()?
            .get(file_name)
            .cloned()
            .ok_or_else(|| ErrorNotFound("Not found"))
    }

    fn object_exists(&self, file_name: &str) -> Result<bool, Error> {
        Ok(self.lock()?.contains_key(file_name))
    }

    fn list_objects(&self) -> Result<Vec<FileName>, Error> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}
