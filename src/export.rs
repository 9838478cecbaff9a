//! CSV export of a single student's ledger.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::aggregate::format_cgpa;
use crate::models::StudentSnapshot;

/// CSV text plus the file name it should be saved under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub file_name: String,
    pub contents: String,
}

impl CsvExport {
    /// Write the export into `dir`, returning the full path.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create export directory {}", dir.display()))?;
        let path = dir.join(&self.file_name);
        self.write_to(&path)?;
        Ok(path)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, &self.contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "CSV exported");
        Ok(())
    }
}

/// `Semester,CGPA` header followed by one row per entry, ascending.
pub fn ledger_csv(snapshot: &StudentSnapshot) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Semester", "CGPA"])?;
    for entry in &snapshot.entries {
        writer.write_record([entry.sem.to_string(), format_cgpa(entry.cgpa.value())])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))?;
    // Every field is ASCII digits, dots or the header text.
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// `Siva Sai` becomes `Siva_Sai_cgpa.csv`. Anything other than letters,
/// digits, `-`, `_` and `.` is replaced so the result is always a plain file
/// name; leading dots are dropped so it can never be `.`, `..` or hidden.
pub fn export_file_name(name: &str) -> String {
    let joined = name.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned: String = joined
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || matches!(ch, '-' | '_' | '.') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let stem = cleaned.trim_start_matches('.');
    let stem = if stem.is_empty() { "student" } else { stem };
    format!("{stem}_cgpa.csv")
}

pub fn export(snapshot: &StudentSnapshot) -> Result<CsvExport, csv::Error> {
    Ok(CsvExport {
        file_name: export_file_name(&snapshot.name),
        contents: ledger_csv(snapshot)?,
    })
}
