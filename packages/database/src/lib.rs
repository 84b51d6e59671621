#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! `SQLite` persistence for the crime dashboard.
//!
//! Uses `switchy_database` for all database operations. Two repository
//! traits sit on top of the connection so that callers (and tests) can
//! swap the backing store:
//!
//! - [`firs::FirRepository`] for FIRs and their attachments
//! - [`accounts::AccountRepository`] for dashboard users and sessions
//!
//! [`memory`] provides in-process implementations of both.

pub mod accounts;
pub mod firs;
pub mod memory;

use std::path::Path;

use switchy_database::Database;
use switchy_database_connection::init_sqlite_rusqlite;

/// Default path for the dashboard database.
pub const DEFAULT_DB_PATH: &str = "data/crime_dashboard.db";

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// The database file could not be opened.
    #[error("Failed to open database: {0}")]
    Open(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },

    /// A unique constraint would be violated.
    #[error("Already exists: {0}")]
    Conflict(String),
}

impl DbError {
    pub(crate) fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion {
            message: message.into(),
        }
    }
}

/// Opens (or creates) the dashboard `SQLite` database and ensures the
/// schema exists.
///
/// # Errors
///
/// Returns [`DbError`] if the database cannot be opened or schema creation
/// fails.
pub async fn open_db(path: &Path) -> Result<Box<dyn Database>, DbError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let db = init_sqlite_rusqlite(Some(path)).map_err(|e| DbError::Open(e.to_string()))?;

    ensure_schema(db.as_ref()).await?;
    log::info!("Opened database at {}", path.display());

    Ok(db)
}

/// Creates all tables if they don't already exist.
///
/// # Errors
///
/// Returns [`DbError`] if any statement fails.
pub async fn ensure_schema(db: &dyn Database) -> Result<(), DbError> {
    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS firs (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            complainant_name    TEXT NOT NULL,
            complainant_address TEXT NOT NULL,
            complainant_phone   TEXT,
            complainant_email   TEXT,
            incident_date       TEXT NOT NULL,
            incident_time       TEXT NOT NULL,
            location            TEXT NOT NULL,
            incident_type       TEXT NOT NULL,
            description         TEXT NOT NULL,
            witnesses           TEXT,
            priority            TEXT NOT NULL,
            status              TEXT NOT NULL DEFAULT 'pending',
            created_at          TEXT NOT NULL,
            updated_at          TEXT NOT NULL
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS attachments (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            fir_id        INTEGER NOT NULL REFERENCES firs(id) ON DELETE CASCADE,
            file_path     TEXT NOT NULL,
            file_type     TEXT NOT NULL,
            original_name TEXT NOT NULL,
            size_bytes    INTEGER NOT NULL,
            created_at    TEXT NOT NULL
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE INDEX IF NOT EXISTS idx_attachments_fir
         ON attachments (fir_id)",
    )
    .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS users (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            name          TEXT NOT NULL,
            role          TEXT NOT NULL,
            email         TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            password_salt TEXT NOT NULL,
            created_at    TEXT NOT NULL
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS sessions (
            token      TEXT PRIMARY KEY,
            user_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE INDEX IF NOT EXISTS idx_sessions_expiry
         ON sessions (expires_at)",
    )
    .await?;

    // Enable foreign key enforcement (SQLite has it off by default)
    db.exec_raw("PRAGMA foreign_keys = ON").await?;

    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    use switchy_database::Database;

    /// Opens a fresh database file under the system temp directory.
    pub async fn temp_db(name: &str) -> (Box<dyn Database>, PathBuf) {
        let path = std::env::temp_dir().join(format!(
            "crime_dashboard_{name}_{}.db",
            uuid::Uuid::new_v4().simple()
        ));
        let db = super::open_db(&path).await.unwrap();
        (db, path)
    }

    pub fn cleanup(path: &PathBuf) {
        let _ = std::fs::remove_file(path);
        let _ = std::fs::remove_file(path.with_extension("db-wal"));
        let _ = std::fs::remove_file(path.with_extension("db-shm"));
    }
}
