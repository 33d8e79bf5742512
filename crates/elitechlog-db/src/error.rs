use std::path::PathBuf;
use thiserror::Error;

use elitechlog_transport::TransportError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Database file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown reading column: {0}")]
    UnknownColumn(String),

    #[error("Failed to read legacy source: {0}")]
    Legacy(#[source] TransportError),
}
