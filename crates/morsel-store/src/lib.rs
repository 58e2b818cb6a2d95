//! SQLite store merging exported CSV trees for cross-site analysis.
//!
//! Rows are created once at import time and never updated in place:
//! re-importing already-present data violates a uniqueness constraint and
//! fails loudly instead of merging.

pub mod importer;

use std::path::Path;

use rusqlite::{Connection, ErrorCode};
use thiserror::Error;
use tracing::info;

pub use importer::{CsvClass, ImportSummary, Table, classify};

pub const DATABASE_FILE: &str = "site_cookies.db";

const CREATE_COOKIES_TABLE: &str = "CREATE TABLE IF NOT EXISTS cookies (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    url TEXT NOT NULL,
    date TEXT NOT NULL,
    flow TEXT NOT NULL,
    block_third_party BOOLEAN NOT NULL,

    host TEXT NOT NULL,
    name TEXT NOT NULL,
    value TEXT,
    path TEXT NOT NULL,
    expires_utc INTEGER,
    is_secure BOOLEAN NOT NULL,
    is_httponly BOOLEAN NOT NULL,
    has_expires BOOLEAN NOT NULL,
    is_persistent BOOLEAN NOT NULL,
    priority INTEGER NOT NULL,
    samesite INTEGER NOT NULL,
    source_scheme INTEGER NOT NULL,

    UNIQUE (host, name, path, date, flow, block_third_party, url)
)";

const CREATE_STATS_TABLE: &str = "CREATE TABLE IF NOT EXISTS stats (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    url TEXT NOT NULL,
    date TEXT NOT NULL,
    flow TEXT NOT NULL,
    block_third_party BOOLEAN NOT NULL,

    total INTEGER NOT NULL,
    session INTEGER NOT NULL,
    max_exp_days INTEGER NOT NULL,
    avg_exp_days INTEGER NOT NULL,
    secure_flag INTEGER NOT NULL,
    httponly_flag INTEGER NOT NULL,
    samesite_none_flag INTEGER NOT NULL,
    samesite_lax_flag INTEGER NOT NULL,
    samesite_strict_flag INTEGER NOT NULL,

    UNIQUE (date, flow, block_third_party, url)
)";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("database error: {0}")]
    Sqlite(rusqlite::Error),
    #[error("duplicate key, data already imported: {0}")]
    Duplicate(rusqlite::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(inner, _) = &e {
            if inner.code == ErrorCode::ConstraintViolation {
                return StoreError::Duplicate(e);
            }
        }
        StoreError::Sqlite(e)
    }
}

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open the store under `db_dir`. The default is a fresh start: the
    /// whole directory is wiped and recreated. `keep` preserves existing
    /// data for incremental imports.
    pub fn open(db_dir: &Path, keep: bool) -> Result<Self, StoreError> {
        if !keep && db_dir.exists() {
            info!("wiping the database directory to start fresh");
            std::fs::remove_dir_all(db_dir)?;
        }
        std::fs::create_dir_all(db_dir)?;
        let conn = Connection::open(db_dir.join(DATABASE_FILE))?;
        conn.execute_batch(&format!("{CREATE_COOKIES_TABLE}; {CREATE_STATS_TABLE};"))?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
