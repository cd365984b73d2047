//! Local directory blob storage implementation

use crate::storage::{FileName, Storage};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use actix_web::Error;
use actix_web::error::{ErrorBadRequest, ErrorInternalServerError, ErrorNotFound};
use log::{debug, info, warn};
use tempfile::Builder;

use crate::config::INDEX_FILE_NAME;

/// Prefix of in-flight uploads staged in the storage directory
pub const STAGING_PREFIX: &str = ".upload-";

/// Files SQLite keeps next to the index database
const INDEX_COMPANION_SUFFIXES: [&str; 3] = ["-wal", "-shm", "-journal"];

/// Whether an entry is owned by the service rather than holding a blob
fn is_service_entry(file_name: &str) -> bool {
    if file_name.starts_with(STAGING_PREFIX) {
        return true;
    }
    match file_name.strip_prefix(INDEX_FILE_NAME) {
        Some("") => true,
        Some(suffix) => INDEX_COMPANION_SUFFIXES.contains(&suffix),
        None => false,
    }
}

/// Whether a name addresses a blob directly inside the storage directory
fn is_blob_name(file_name: &str) -> bool {
    !file_name.is_empty()
        && file_name != "."
        && file_name != ".."
        && !file_name.contains(['/', '\\'])
        && !is_service_entry(file_name)
}

/// One file per blob inside a single directory
pub struct LocalDirStore {
    storage_path: PathBuf,
}

impl LocalDirStore {
    /// Open the store, creating the directory recursively if it is missing
    pub fn new(storage_path: impl AsRef<Path>) -> io::Result<Self> {
        let storage_path = storage_path.as_ref().to_path_buf();
        if !storage_path.exists() {
            fs::create_dir_all(&storage_path)?;
            info!("Created storage directory: {}", storage_path.display());
        }
        info!("Using storage directory: {}", storage_path.display());
        Ok(Self { storage_path })
    }

    /// Directory holding the blobs
    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    fn object_path(&self, file_name: &str) -> PathBuf {
        self.storage_path.join(file_name)
    }
}

impl Storage for LocalDirStore {
    fn put_object(&self, file_name: &str, data: &[u8]) -> Result<(), Error> {
        if !is_blob_name(file_name) {
            return Err(ErrorBadRequest(format!("Invalid file name: {}", file_name)));
        }

        // Stage next to the target so the rename stays on one filesystem
        let mut staged = Builder::new()
            .prefix(STAGING_PREFIX)
            .tempfile_in(&self.storage_path)
            .map_err(ErrorInternalServerError)?;
        staged.write_all(data)
            .map_err(ErrorInternalServerError)?;
        staged.as_file().sync_all()
            .map_err(ErrorInternalServerError)?;

        let path = self.object_path(file_name);
        staged.persist_noclobber(&path)
            .map_err(|e| ErrorInternalServerError(e.error))?;

        info!("Stored {} bytes at {}", data.len(), path.display());
        Ok(())
    }

    fn get_object(&self, file_name: &str) -> Result<Vec<u8>, Error> {
        if !is_blob_name(file_name) {
            return Err(ErrorNotFound("Not found"));
        }

        let path = self.object_path(file_name);
        if path.is_dir() {
            return Err(ErrorNotFound("Not found"));
        }
        match fs::read(&path) {
            Ok(data) => {
                debug!("Read {} bytes from {}", data.len(), path.display());
                Ok(data)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ErrorNotFound("Not found")),
            Err(e) => Err(ErrorInternalServerError(e)),
        }
    }

    fn object_exists(&self, file_name: &str) -> Result<bool, Error> {
        if !is_blob_name(file_name) {
            return Ok(false);
        }
        Ok(self.object_path(file_name).is_file())
    }

    fn list_objects(&self) -> Result<Vec<FileName>, Error> {
        let entries = fs::read_dir(&self.storage_path)
            .map_err(ErrorInternalServerError)?;

        let mut objects = Vec::new();
        for entry in entries {
            let entry = entry.map_err(ErrorInternalServerError)?;
            match entry.file_name().into_string() {
                Ok(name) if is_blob_name(&name) => objects.push(name),
                Ok(_) => {}
                Err(name) => warn!("Skipping non UTF-8 entry in storage directory: {:?}", name),
            }
        }

        Ok(objects)
    }
}
