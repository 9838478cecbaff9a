//! Error types shared by the data model, the persistence layer and the
//! session controller. Every variant is recoverable: nothing in the core is
//! allowed to terminate the process.

use thiserror::Error;

use crate::models::StudentId;

/// Input rejected before any mutation took place.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Semester number must be positive (got {0}).")]
    NonPositiveSemester(i64),
    #[error("Semester number is too large (got {0}).")]
    SemesterTooLarge(i64),
    #[error("CGPA must be between 0 and 10 (got {0}).")]
    CgpaOutOfRange(f64),
    #[error("{0} is required.")]
    EmptyField(&'static str),
}

/// A command referenced a student id that is not in the repository.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Student {0} not found")]
pub struct NotFound(pub StudentId);

/// Durable write or open failure. The in-memory state stays authoritative
/// when one of these is returned.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to open record store")]
    Open(#[source] rusqlite::Error),

    #[error("failed to prepare record store schema")]
    Schema(#[source] rusqlite::Error),

    #[error("record store schema version {found} is newer than supported ({supported})")]
    UnsupportedVersion { found: i64, supported: i64 },

    #[error("failed to serialize student records")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to write student records")]
    Write(#[source] rusqlite::Error),
}

/// Everything `Session::handle` can report back to the view.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFound),

    #[error("No student is currently selected.")]
    NoCurrentStudent,

    #[error("failed to build CSV export")]
    Export(#[source] csv::Error),
}
