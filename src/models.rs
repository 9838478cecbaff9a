//! Domain models that mirror the persisted JSON document and get passed
//! through the session to the view. They stay light-weight data holders; the
//! rules about how they change live in `ledger`, `repository` and `session`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ledger::Ledger;

pub use crate::id::{new_id, StudentId};

/// Lowest and highest CGPA a semester may record.
pub const CGPA_MIN: f64 = 0.0;
pub const CGPA_MAX: f64 = 10.0;

/// First-semester CGPA of the seed record.
const SEED_CGPA: Cgpa = Cgpa(6.8);

/// A CGPA value known to lie in `[0, 10]`. Outside this module the only way
/// to build one is through `Cgpa::new`, so every stored value is valid by
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Cgpa(f64);

impl Cgpa {
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        // NaN fails both comparisons and is rejected here too.
        if (CGPA_MIN..=CGPA_MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::CgpaOutOfRange(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Cgpa {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Cgpa> for f64 {
    fn from(value: Cgpa) -> Self {
        value.0
    }
}

impl fmt::Display for Cgpa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// One row of a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SemesterEntry {
    pub sem: u32,
    pub cgpa: Cgpa,
}

/// The editable profile of a student. Commands carry these already trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentFields {
    pub name: String,
    pub college: String,
    pub branch: String,
    pub batch: String,
}

impl StudentFields {
    pub fn new(
        name: impl Into<String>,
        college: impl Into<String>,
        branch: impl Into<String>,
        batch: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            college: college.into(),
            branch: branch.into(),
            batch: batch.into(),
        }
    }

    /// Reject the first blank field, in form order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("Name", &self.name),
            ("College", &self.college),
            ("Branch", &self.branch),
            ("Batch", &self.batch),
        ];
        for (label, value) in fields {
            if value.trim().is_empty() {
                return Err(ValidationError::EmptyField(label));
            }
        }
        Ok(())
    }
}

/// A student record exactly as it is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub college: String,
    pub branch: String,
    pub batch: String,
    #[serde(default)]
    pub semesters: Ledger,
}

impl Student {
    /// Build a student with an empty ledger.
    pub fn new(id: StudentId, fields: StudentFields) -> Self {
        Self {
            id,
            name: fields.name,
            college: fields.college,
            branch: fields.branch,
            batch: fields.batch,
            semesters: Ledger::default(),
        }
    }

    /// The default record created on first run or after the last student is
    /// deleted.
    pub fn seed() -> Self {
        let mut student = Self::new(
            new_id(),
            StudentFields::new(
                "Siva Sai",
                "Narasaraopet Engineering College",
                "CSE - AI",
                "2024 - 2028",
            ),
        );
        student.semesters = Ledger::with_entry(SemesterEntry {
            sem: 1,
            cgpa: SEED_CGPA,
        });
        student
    }

    pub fn fields(&self) -> StudentFields {
        StudentFields::new(&self.name, &self.college, &self.branch, &self.batch)
    }

    /// Overwrite the profile fields, leaving the ledger alone.
    pub fn apply(&mut self, fields: StudentFields) {
        self.name = fields.name;
        self.college = fields.college;
        self.branch = fields.branch;
        self.batch = fields.batch;
    }

    pub fn snapshot(&self) -> StudentSnapshot {
        StudentSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            college: self.college.clone(),
            branch: self.branch.clone(),
            batch: self.batch.clone(),
            entries: self.semesters.entries(),
            overall: crate::aggregate::overall(&self.semesters),
        }
    }
}

impl fmt::Display for Student {
    /// `Name - Branch`, the label used by student pickers.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.name, self.branch)
    }
}

/// Render payload handed to the view after every command: the full current
/// student with its ledger sorted and the overall CGPA already computed.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentSnapshot {
    pub id: StudentId,
    pub name: String,
    pub college: String,
    pub branch: String,
    pub batch: String,
    pub entries: Vec<SemesterEntry>,
    pub overall: f64,
}

impl StudentSnapshot {
    pub fn overall_display(&self) -> String {
        crate::aggregate::format_cgpa(self.overall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cgpa_accepts_inclusive_bounds() {
        assert!(Cgpa::new(0.0).is_ok());
        assert!(Cgpa::new(10.0).is_ok());
        assert_eq!(Cgpa::new(7.5).map(Cgpa::value), Ok(7.5));
    }

    #[test]
    fn cgpa_rejects_out_of_range_and_nan() {
        assert!(matches!(
            Cgpa::new(10.01),
            Err(ValidationError::CgpaOutOfRange(_))
        ));
        assert!(matches!(
            Cgpa::new(-0.01),
            Err(ValidationError::CgpaOutOfRange(_))
        ));
        assert!(Cgpa::new(f64::NAN).is_err());
    }

    #[test]
    fn fields_report_first_blank_field() {
        let fields = StudentFields::new("Asha", "", "  ", "2023 - 2027");
        assert_eq!(
            fields.validate(),
            Err(ValidationError::EmptyField("College"))
        );
        assert!(StudentFields::new("a", "b", "c", "d").validate().is_ok());
    }

    #[test]
    fn seed_student_matches_first_run_record() {
        let seed = Student::seed();
        assert_eq!(seed.name, "Siva Sai");
        assert_eq!(seed.college, "Narasaraopet Engineering College");
        assert_eq!(seed.branch, "CSE - AI");
        assert_eq!(seed.batch, "2024 - 2028");
        assert!(!seed.id.is_empty());

        let snapshot = seed.snapshot();
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.entries[0].sem, 1);
        assert_eq!(snapshot.overall_display(), "6.80");
    }

    #[test]
    fn seeds_get_distinct_ids() {
        assert_ne!(Student::seed().id, Student::seed().id);
    }

    #[test]
    fn apply_keeps_the_ledger() {
        let mut student = Student::seed();
        student.apply(StudentFields::new("Ravi", "JNTU", "ECE", "2022 - 2026"));
        assert_eq!(student.name, "Ravi");
        assert_eq!(student.semesters.len(), 1);
        assert_eq!(student.to_string(), "Ravi - ECE");
    }
}
