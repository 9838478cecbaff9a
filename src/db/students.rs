use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use super::connection::open_store;
use crate::error::PersistenceError;
use crate::models::Student;
use crate::store::{decode_students, encode_students, StudentStore};

/// Key holding the JSON document with every student. The suffix is the
/// document version; other `students.*` keys are never read back.
pub const STUDENTS_KEY: &str = "students.v1";

/// Fetch the student document. Any failure along the way (missing row,
/// unreadable value, malformed JSON) is logged and reported as no data.
pub fn load_students(conn: &Connection) -> Vec<Student> {
    warn_on_foreign_documents(conn);

    let raw: Option<String> = match conn
        .query_row(
            "SELECT value FROM app_state WHERE key = ?1",
            params![STUDENTS_KEY],
            |row| row.get(0),
        )
        .optional()
    {
        Ok(raw) => raw,
        Err(err) => {
            warn!(error = %err, "failed to read persisted students");
            return Vec::new();
        }
    };

    match raw {
        Some(raw) => decode_students(&raw),
        None => {
            debug!("no persisted students yet");
            Vec::new()
        }
    }
}

/// Write the whole collection as one row inside a transaction so a failed
/// write never leaves a half-updated document behind.
pub fn save_students(conn: &mut Connection, students: &[Student]) -> Result<(), PersistenceError> {
    let document = encode_students(students)?;
    let tx = conn.transaction().map_err(PersistenceError::Write)?;
    tx.execute(
        "INSERT INTO app_state (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![STUDENTS_KEY, document],
    )
    .map_err(PersistenceError::Write)?;
    tx.commit().map_err(PersistenceError::Write)?;
    debug!(count = students.len(), "students saved");
    Ok(())
}

/// Documents written under another version key are not migrated. Say so once
/// at load time so a silent reset is at least visible in the log.
fn warn_on_foreign_documents(conn: &Connection) {
    let keys = conn
        .prepare("SELECT key FROM app_state WHERE key LIKE 'students.%' AND key <> ?1")
        .and_then(|mut stmt| {
            let keys = stmt
                .query_map(params![STUDENTS_KEY], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>();
            keys
        });
    match keys {
        Ok(keys) => {
            for key in keys {
                warn!(key = %key, current = STUDENTS_KEY, "ignoring student document with unsupported version");
            }
        }
        Err(err) => debug!(error = %err, "could not list stored documents"),
    }
}

/// `StudentStore` backed by a SQLite file.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, PersistenceError> {
        open_store(path).map(Self::from_connection)
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl StudentStore for SqliteStore {
    fn load(&mut self) -> Vec<Student> {
        load_students(&self.conn)
    }

    fn save(&mut self, students: &[Student]) -> Result<(), PersistenceError> {
        save_students(&mut self.conn, students)
    }
}
