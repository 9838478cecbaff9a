//! The persistence boundary. The session only ever talks to a `StudentStore`;
//! the SQLite-backed implementation lives in `db`, and `MemoryStore` covers
//! tests and `--ephemeral` runs.

use tracing::warn;

use crate::error::PersistenceError;
use crate::models::Student;

pub trait StudentStore {
    /// Read the whole collection. Missing or unreadable data comes back as an
    /// empty vector; the caller seeds in that case.
    fn load(&mut self) -> Vec<Student>;

    /// Replace the whole collection in one write.
    fn save(&mut self, students: &[Student]) -> Result<(), PersistenceError>;
}

/// Decode a persisted document, treating anything unreadable as "no data".
pub fn decode_students(raw: &str) -> Vec<Student> {
    match serde_json::from_str::<Vec<Student>>(raw) {
        Ok(students) => {
            if let Some(problem) = collection_problem(&students) {
                warn!(problem, "discarding persisted students");
                Vec::new()
            } else {
                students
            }
        }
        Err(err) => {
            warn!(error = %err, "persisted students are not valid JSON, ignoring");
            Vec::new()
        }
    }
}

pub fn encode_students(students: &[Student]) -> Result<String, PersistenceError> {
    serde_json::to_string(students).map_err(PersistenceError::Serialize)
}

/// Invariants the ledger and Cgpa types cannot check on their own.
fn collection_problem(students: &[Student]) -> Option<&'static str> {
    let mut seen = std::collections::HashSet::with_capacity(students.len());
    for student in students {
        if student.id.is_empty() {
            return Some("student with empty id");
        }
        if !seen.insert(&student.id) {
            return Some("duplicate student id");
        }
    }
    None
}

/// Keeps the last saved document in memory, encoded exactly as the SQLite
/// store would write it.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    document: Option<String>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a raw document, e.g. to simulate corrupt storage.
    pub fn with_document(raw: impl Into<String>) -> Self {
        Self {
            document: Some(raw.into()),
            saves: 0,
        }
    }

    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    /// Number of successful saves so far.
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl StudentStore for MemoryStore {
    fn load(&mut self) -> Vec<Student> {
        self.document
            .as_deref()
            .map(decode_students)
            .unwrap_or_default()
    }

    fn save(&mut self, students: &[Student]) -> Result<(), PersistenceError> {
        self.document = Some(encode_students(students)?);
        self.saves += 1;
        Ok(())
    }
}
