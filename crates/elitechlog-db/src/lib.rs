//! Reading store for elitechlog.
//!
//! Provides a `Database` struct that owns the SQLite connection together
//! with the known reading schema, and gives access to device records,
//! reading ingestion and reading queries.

mod devices;
mod error;
mod ingest;
mod migrate;
mod readings;
mod schema;

pub use devices::{DeviceRecord, Devices};
pub use error::StoreError;
pub use ingest::{default_data_name, BATCH_SIZE};
pub use migrate::{migrate, LegacySource, MigrationProgress, MigrationReport, SnapshotArchive};
pub use readings::{ExportTable, ReadingFilter, SeriesPoint};

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use schema::ReadingSchema;

/// Connection plus the reading columns known to exist in it.
pub(crate) struct StoreState {
    pub(crate) conn: Connection,
    pub(crate) schema: ReadingSchema,
}

/// The main database struct that owns the SQLite connection.
pub struct Database {
    state: Mutex<StoreState>,
}

impl Database {
    /// Open or create a database at a specific path, creating parent
    /// directories as needed.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an existing database without creating it.
    pub fn open_existing(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an in-memory database (useful for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Get the default database path.
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("elitechlog")
            .join("elitechlog.db")
    }

    /// Access the device records.
    pub fn devices(&self) -> Devices<'_> {
        Devices::new(self.state())
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        Self::init_schema(&conn)?;
        let schema = ReadingSchema::load(&conn)?;
        Ok(Self {
            state: Mutex::new(StoreState { conn, schema }),
        })
    }

    /// Initialize the database schema.
    fn init_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS device (
                serial_number TEXT,
                timestamp INTEGER,
                data_name TEXT,
                travel_number TEXT,
                record_count INTEGER,
                read_count INTEGER,
                max_value1 REAL,
                min_value1 REAL,
                max_value2 REAL,
                min_value2 REAL,
                sensor2_available INTEGER,
                started_at DATETIME,
                warning INTEGER,
                sensor2_type TEXT,
                UNIQUE(data_name)
            );

            CREATE TABLE IF NOT EXISTS reading (
                serial_number TEXT,
                timestamp INTEGER,
                UNIQUE(serial_number, timestamp)
            );
            "#,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_creates_tables() {
        let db = Database::open_in_memory().unwrap();
        let state = db.state();
        let tables: Vec<String> = state
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(tables, vec!["device", "reading"]);
        assert!(state.schema.contains("serial_number"));
        assert!(state.schema.contains("timestamp"));
    }

    #[test]
    fn test_open_existing_requires_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("missing.db");
        assert!(matches!(
            Database::open_existing(&path),
            Err(StoreError::NotFound(_))
        ));

        Database::open_at(&path).unwrap();
        assert!(Database::open_existing(&path).is_ok());
    }
}
