//! SQLite implementation of MetadataStorage trait

use crate::metadata::{BlobRecord, MetadataStorage};
use std::io;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use actix_web::Error;
use actix_web::error::{ErrorBadRequest, ErrorInternalServerError, ErrorNotFound};
use chrono::{DateTime, Utc};
use log::{info, warn};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS blobs (
    data_key TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    file_name TEXT NOT NULL UNIQUE,
    content_type TEXT NOT NULL,
    size INTEGER NOT NULL,
    checksum TEXT NOT NULL,
    created_at TEXT NOT NULL
)";

const SELECT_COLUMNS: &str =
    "SELECT data_key, name, file_name, content_type, size, checksum, created_at FROM blobs";

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<BlobRecord> {
    let size: i64 = row.get(4)?;
    let created_at: String = row.get(6)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(BlobRecord {
        data_key: row.get(0)?,
        name: row.get(1)?,
        file_name: row.get(2)?,
        content_type: row.get(3)?,
        size: size as u64,
        checksum: row.get(5)?,
        created_at,
    })
}

/// SQLite implementation of MetadataStorage
pub struct SQLiteMetadataStore {
    conn: Mutex<Connection>,
}

impl SQLiteMetadataStore {
    /// Open (or create) the index database at `db_path`
    pub fn open(db_path: &Path, wal_mode: bool) -> io::Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path).map_err(io::Error::other)?;
        if wal_mode {
            let mode: String = conn
                .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
                .map_err(io::Error::other)?;
            if !mode.eq_ignore_ascii_case("wal") {
                warn!("SQLite refused WAL mode, journal_mode is {}", mode);
            }
        }

        info!("Using metadata index at {}", db_path.display());
        Self::with_connection(conn)
    }

    /// Create an index that lives only in memory
    pub fn in_memory() -> io::Result<Self> {
        let conn = Connection::open_in_memory().map_err(io::Error::other)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> io::Result<Self> {
        conn.execute(CREATE_TABLE, []).map_err(io::Error::other)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.conn.lock().map_err(|_| ErrorInternalServerError("Metadata index lock poisoned"))
    }
}

impl MetadataStorage for SQLiteMetadataStore {
    fn put_metadata(&self, record: &BlobRecord) -> Result<(), Error> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO blobs (data_key, name, file_name, content_type, size, checksum, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.data_key,
                record.name,
                record.file_name,
                record.content_type,
                record.size as i64,
                record.checksum,
                record.created_at.to_rfc3339(),
            ],
        ).map_err(|e| match e {
            rusqlite::Error::SqliteFailure(ref failure, _) if failure.code == ErrorCode::ConstraintViolation => {
                warn!("Duplicate index entry for key {}: {}", record.data_key, e);
                ErrorBadRequest("Key already exists")
            }
            other => ErrorInternalServerError(other),
        })?;

        Ok(())
    }

    fn get_metadata(&self, data_key: &str) -> Result<BlobRecord, Error> {
        let conn = self.lock()?;
        let sql = format!("{} WHERE data_key = ?1", SELECT_COLUMNS);

        conn.query_row(&sql, params![data_key], record_from_row)
            .optional()
            .map_err(ErrorInternalServerError)?
            .ok_or_else(|| ErrorNotFound(format!("No data found for key: {}", data_key)))
    }

    fn object_exists(&self, data_key: &str) -> Result<bool, Error> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM blobs WHERE data_key = ?1", params![data_key], |row| row.get(0))
            .map_err(ErrorInternalServerError)?;

        Ok(count > 0)
    }

    fn list_metadata(&self) -> Result<Vec<BlobRecord>, Error> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(SELECT_COLUMNS)
            .map_err(ErrorInternalServerError)?;

        let rows = stmt.query_map([], record_from_row)
            .map_err(ErrorInternalServerError)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(ErrorInternalServerError)?);
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_metadata_store_basic_operations() {
        let store = SQLiteMetadataStore::in_memory().unwrap();
        let record = BlobRecord::new("key1", "match.json", "key1__match.json", b"{}");

        store.put_metadata(&record).unwrap();

        assert!(store.object_exists("key1").unwrap());
        assert!(!store.object_exists("nonexistent").unwrap());

        let retrieved = store.get_metadata("key1").unwrap();
        assert_eq!(retrieved.file_name, "key1__match.json");
        assert_eq!(retrieved.size, 2);
        assert_eq!(retrieved.checksum, record.checksum);
        assert_eq!(retrieved.created_at.timestamp_micros(), record.created_at.timestamp_micros());

        let records = store.list_metadata().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].data_key, "key1");
    }

    #[test]
    fn test_sqlite_metadata_store_rejects_duplicates() {
        let store = SQLiteMetadataStore::in_memory().unwrap();
        let record = BlobRecord::new("key1", "a.json", "key1__a.json", b"a");
        store.put_metadata(&record).unwrap();

        let again = BlobRecord::new("key1", "b.json", "key1__b.json", b"b");
        let err = store.put_metadata(&again).unwrap_err();
        assert_eq!(err.as_response_error().status_code(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_sqlite_metadata_store_missing_key() {
        let store = SQLiteMetadataStore::in_memory().unwrap();
        let err = store.get_metadata("missing").unwrap_err();
        assert_eq!(err.as_response_error().status_code(), actix_web::http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_sqlite_index_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested/.index.sqlite3");

        {
            let store = SQLiteMetadataStore::open(&db_path, true).unwrap();
            store.put_metadata(&BlobRecord::new("key1", "a.json", "key1__a.json", b"a")).unwrap();
        }

        let store = SQLiteMetadataStore::open(&db_path, true).unwrap();
        assert!(store.object_exists("key1").unwrap());
    }
}
