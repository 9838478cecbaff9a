//! Per-student semester ledger. Entries are keyed by semester number; adding
//! a semester that already exists overwrites its CGPA instead of appending a
//! second row. Storage keeps insertion order and every read sorts a copy, so
//! rendering can never reorder what gets persisted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ValidationError;
use crate::models::{Cgpa, SemesterEntry};

/// Raised when a persisted ledger breaks the one-entry-per-semester rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidLedger {
    #[error("semester number 0 is not allowed")]
    ZeroSemester,
    #[error("semester {0} appears more than once")]
    DuplicateSemester(u32),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SemesterEntry>", into = "Vec<SemesterEntry>")]
pub struct Ledger {
    entries: Vec<SemesterEntry>,
}

impl Ledger {
    /// Validate both inputs, then insert or overwrite the entry for `sem`.
    /// Nothing changes when validation fails.
    pub fn upsert(&mut self, sem: i64, cgpa: f64) -> Result<(), ValidationError> {
        let sem = validate_semester(sem)?;
        let cgpa = Cgpa::new(cgpa)?;

        match self.entries.iter_mut().find(|entry| entry.sem == sem) {
            Some(existing) => existing.cgpa = cgpa,
            None => self.entries.push(SemesterEntry { sem, cgpa }),
        }
        Ok(())
    }

    /// A ledger holding exactly one entry.
    pub fn with_entry(entry: SemesterEntry) -> Self {
        Self {
            entries: vec![entry],
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries ascending by semester number.
    pub fn entries(&self) -> Vec<SemesterEntry> {
        let mut sorted = self.entries.clone();
        sorted.sort_by_key(|entry| entry.sem);
        sorted
    }

    pub fn get(&self, sem: u32) -> Option<Cgpa> {
        self.entries
            .iter()
            .find(|entry| entry.sem == sem)
            .map(|entry| entry.cgpa)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in storage order. Aggregates do not care about ordering.
    pub(crate) fn iter_unordered(&self) -> impl Iterator<Item = &SemesterEntry> {
        self.entries.iter()
    }
}

fn validate_semester(sem: i64) -> Result<u32, ValidationError> {
    if sem <= 0 {
        return Err(ValidationError::NonPositiveSemester(sem));
    }
    u32::try_from(sem).map_err(|_| ValidationError::SemesterTooLarge(sem))
}

impl TryFrom<Vec<SemesterEntry>> for Ledger {
    type Error = InvalidLedger;

    fn try_from(entries: Vec<SemesterEntry>) -> Result<Self, Self::Error> {
        let mut seen = std::collections::HashSet::with_capacity(entries.len());
        for entry in &entries {
            if entry.sem == 0 {
                return Err(InvalidLedger::ZeroSemester);
            }
            if !seen.insert(entry.sem) {
                return Err(InvalidLedger::DuplicateSemester(entry.sem));
            }
        }
        Ok(Self { entries })
    }
}

impl From<Ledger> for Vec<SemesterEntry> {
    fn from(ledger: Ledger) -> Self {
        ledger.entries
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn cgpa_of(ledger: &Ledger, sem: u32) -> Option<f64> {
        ledger.get(sem).map(Cgpa::value)
    }

    #[test]
    fn upsert_twice_keeps_one_entry() {
        let mut ledger = Ledger::default();
        ledger.upsert(3, 8.5).unwrap();
        ledger.upsert(3, 8.5).unwrap();

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.entries()[0].cgpa.to_string(), "8.50");
    }

    #[test]
    fn update_overwrites_in_place() {
        let mut ledger = Ledger::default();
        ledger.upsert(1, 6.8).unwrap();
        ledger.upsert(2, 7.2).unwrap();
        ledger.upsert(1, 7.8).unwrap();

        assert_eq!(ledger.len(), 2);
        assert_eq!(cgpa_of(&ledger, 1), Some(7.8));
        assert_eq!(cgpa_of(&ledger, 2), Some(7.2));
    }

    #[test]
    fn reads_are_sorted_without_touching_storage() {
        let mut ledger = Ledger::default();
        ledger.upsert(4, 8.0).unwrap();
        ledger.upsert(1, 6.0).unwrap();
        ledger.upsert(3, 7.0).unwrap();

        let sems: Vec<u32> = ledger.entries().iter().map(|entry| entry.sem).collect();
        assert_eq!(sems, vec![1, 3, 4]);

        let stored: Vec<u32> = ledger.iter_unordered().map(|entry| entry.sem).collect();
        assert_eq!(stored, vec![4, 1, 3]);
    }

    #[test]
    fn boundary_values_are_rejected_without_mutation() {
        let mut ledger = Ledger::default();
        ledger.upsert(1, 6.8).unwrap();
        let before = ledger.clone();

        assert_eq!(
            ledger.upsert(0, 5.0),
            Err(ValidationError::NonPositiveSemester(0))
        );
        assert_eq!(
            ledger.upsert(2, 10.01),
            Err(ValidationError::CgpaOutOfRange(10.01))
        );
        assert_eq!(
            ledger.upsert(2, -0.01),
            Err(ValidationError::CgpaOutOfRange(-0.01))
        );
        assert_eq!(
            ledger.upsert(-4, 5.0),
            Err(ValidationError::NonPositiveSemester(-4))
        );
        assert_eq!(
            ledger.upsert(5_000_000_000, 5.0),
            Err(ValidationError::SemesterTooLarge(5_000_000_000))
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn too_large_semester_names_the_limit() {
        let err = Ledger::default().upsert(i64::from(u32::MAX) + 1, 7.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Semester number is too large (got 4294967296)."
        );
    }

    #[test]
    fn clear_removes_everything() {
        let mut ledger = Ledger::default();
        ledger.upsert(1, 6.8).unwrap();
        ledger.upsert(2, 9.1).unwrap();
        ledger.clear();
        assert!(ledger.is_empty());
    }

    #[test]
    fn deserializing_duplicate_semesters_fails() {
        let raw = r#"[{"sem":1,"cgpa":6.0},{"sem":1,"cgpa":7.0}]"#;
        assert!(serde_json::from_str::<Ledger>(raw).is_err());

        let zero = r#"[{"sem":0,"cgpa":6.0}]"#;
        assert!(serde_json::from_str::<Ledger>(zero).is_err());

        let out_of_range = r#"[{"sem":1,"cgpa":11.0}]"#;
        assert!(serde_json::from_str::<Ledger>(out_of_range).is_err());
    }

    proptest! {
        #[test]
        fn upsert_reads_back_and_grows_by_at_most_one(
            seeds in proptest::collection::vec((1i64..12, 0.0f64..=10.0), 0..10),
            sem in 1i64..12,
            cgpa in 0.0f64..=10.0,
        ) {
            let mut ledger = Ledger::default();
            for (s, c) in seeds {
                ledger.upsert(s, c).unwrap();
            }
            let existed = ledger.get(sem as u32).is_some();
            let before = ledger.len();

            ledger.upsert(sem, cgpa).unwrap();

            prop_assert_eq!(cgpa_of(&ledger, sem as u32), Some(cgpa));
            let expected = if existed { before } else { before + 1 };
            prop_assert_eq!(ledger.len(), expected);
        }

        #[test]
        fn entries_are_always_ascending(
            seeds in proptest::collection::vec((1i64..40, 0.0f64..=10.0), 0..25),
        ) {
            let mut ledger = Ledger::default();
            for (s, c) in seeds {
                ledger.upsert(s, c).unwrap();
            }
            let entries = ledger.entries();
            prop_assert!(entries.windows(2).all(|pair| pair[0].sem < pair[1].sem));
        }
    }
}
