use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories::BaseDirs;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::PersistenceError;

/// Folder name used beneath the user's home directory for application data.
pub(crate) const DATA_DIR_NAME: &str = ".cgpa-tracker";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "records.sqlite";

/// Layout version recorded in `PRAGMA user_version`. Bump it together with a
/// migration step in `ensure_schema`; files written by a newer build are
/// refused rather than guessed at.
pub const SCHEMA_VERSION: i64 = 1;

/// Open (or create) the database at `path` and make sure the key-value table
/// exists.
pub fn open_store(path: &Path) -> Result<Connection, PersistenceError> {
    let conn = Connection::open(path).map_err(PersistenceError::Open)?;
    ensure_schema(&conn)?;
    info!(path = %path.display(), "record store opened");
    Ok(conn)
}

/// Create the `app_state` table on a fresh database and stamp the schema
/// version. A file stamped with a newer version is left untouched.
pub(crate) fn ensure_schema(conn: &Connection) -> Result<(), PersistenceError> {
    let found: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(PersistenceError::Schema)?;
    if found > SCHEMA_VERSION {
        return Err(PersistenceError::UnsupportedVersion {
            found,
            supported: SCHEMA_VERSION,
        });
    }

    conn.execute(
        "CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )
    .map_err(PersistenceError::Schema)?;

    if found < SCHEMA_VERSION {
        debug!(from = found, to = SCHEMA_VERSION, "stamping schema version");
        conn.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))
            .map_err(PersistenceError::Schema)?;
    }

    Ok(())
}

/// Resolve the default database location inside the user's home.
pub fn default_db_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME).join(DB_FILE_NAME))
}
