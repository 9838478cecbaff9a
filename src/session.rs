//! Command dispatch for the tracker. `Session` owns the repository and the
//! store; the view sends `Command`s through `handle` and receives snapshots
//! through its `View` implementation.
//!
//! Every data-changing command runs validate, mutate, save, render in that
//! order. Validation happens before any mutation so a rejected command leaves
//! nothing behind. A failed save is reported in the returned `Effect` but does
//! not stop the render: memory stays the source of truth and the next
//! mutation writes the whole collection again.

use tracing::{debug, info, warn};

use crate::error::{CommandError, PersistenceError};
use crate::export::{self, CsvExport};
use crate::models::{new_id, Student, StudentFields, StudentId, StudentSnapshot};
use crate::repository::StudentRepository;
use crate::store::StudentStore;

/// Receives the current student after every command.
pub trait View {
    fn render(&mut self, snapshot: &StudentSnapshot);
}

impl<F> View for F
where
    F: FnMut(&StudentSnapshot),
{
    fn render(&mut self, snapshot: &StudentSnapshot) {
        self(snapshot)
    }
}

/// A view that just remembers the latest payload. Draw loops read from it.
#[derive(Debug, Default, Clone)]
pub struct LatestSnapshot {
    latest: Option<StudentSnapshot>,
    renders: usize,
}

impl LatestSnapshot {
    pub fn latest(&self) -> Option<&StudentSnapshot> {
        self.latest.as_ref()
    }

    pub fn renders(&self) -> usize {
        self.renders
    }
}

impl View for LatestSnapshot {
    fn render(&mut self, snapshot: &StudentSnapshot) {
        self.latest = Some(snapshot.clone());
        self.renders += 1;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Edit the current student, or create one if nothing is selected.
    AddOrUpdateStudent(StudentFields),
    /// Always create a new student and select it.
    AddStudent(StudentFields),
    SelectStudent(StudentId),
    AddSemester { sem: i64, cgpa: f64 },
    DeleteCurrentStudent,
    ClearCurrentSemesters,
    ExportCurrentCsv,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::AddOrUpdateStudent(_) => "add_or_update_student",
            Command::AddStudent(_) => "add_student",
            Command::SelectStudent(_) => "select_student",
            Command::AddSemester { .. } => "add_semester",
            Command::DeleteCurrentStudent => "delete_current_student",
            Command::ClearCurrentSemesters => "clear_current_semesters",
            Command::ExportCurrentCsv => "export_current_csv",
        }
    }
}

/// What a successful command produced.
#[derive(Debug)]
pub enum Effect {
    /// State changed (or the cursor moved) and the view was notified.
    /// `save_error` is set when the durable write failed.
    Rendered {
        snapshot: StudentSnapshot,
        save_error: Option<PersistenceError>,
    },
    /// Pure export; nothing changed.
    Exported(CsvExport),
}

impl Effect {
    pub fn snapshot(&self) -> Option<&StudentSnapshot> {
        match self {
            Effect::Rendered { snapshot, .. } => Some(snapshot),
            Effect::Exported(_) => None,
        }
    }

    pub fn save_error(&self) -> Option<&PersistenceError> {
        match self {
            Effect::Rendered { save_error, .. } => save_error.as_ref(),
            Effect::Exported(_) => None,
        }
    }
}

pub struct Session<S, V> {
    repo: StudentRepository,
    store: S,
    view: V,
    unsaved: bool,
}

impl<S: StudentStore, V: View> Session<S, V> {
    /// Load from the store, seed if needed, and send the first render. The
    /// seed is saved immediately; a failure there is logged and retried on
    /// the next mutation.
    pub fn start(store: S, view: V) -> Self {
        let mut session = Self::open(store, view);
        if session.unsaved {
            if let Some(err) = session.persist() {
                warn!(error = %err, "failed to save seed student");
            }
        }
        session.notify();
        session
    }

    /// Load and seed in memory only. Nothing is written and nothing is
    /// rendered until the first command, so read-only callers leave the store
    /// exactly as they found it.
    pub fn open(mut store: S, view: V) -> Self {
        let (repo, seeded) = StudentRepository::from_loaded(store.load());
        info!(students = repo.len(), seeded, "session started");
        Self {
            repo,
            store,
            view,
            unsaved: seeded,
        }
    }

    pub fn handle(&mut self, command: Command) -> Result<Effect, CommandError> {
        debug!(command = command.name(), "handling command");
        match command {
            Command::AddOrUpdateStudent(fields) => {
                fields.validate()?;
                match self.repo.current_id().cloned() {
                    Some(id) => self.repo.update(&id, fields)?,
                    None => self.create_student(fields),
                }
                self.commit()
            }
            Command::AddStudent(fields) => {
                fields.validate()?;
                self.create_student(fields);
                self.commit()
            }
            Command::SelectStudent(id) => {
                self.repo.select(&id)?;
                let snapshot = self.notify().ok_or(CommandError::NoCurrentStudent)?;
                Ok(Effect::Rendered {
                    snapshot,
                    save_error: None,
                })
            }
            Command::AddSemester { sem, cgpa } => {
                let student = self
                    .repo
                    .current_mut()
                    .ok_or(CommandError::NoCurrentStudent)?;
                student.semesters.upsert(sem, cgpa)?;
                self.commit()
            }
            Command::DeleteCurrentStudent => {
                let id = self
                    .repo
                    .current_id()
                    .cloned()
                    .ok_or(CommandError::NoCurrentStudent)?;
                let removed = self.repo.remove(&id)?;
                info!(id = %removed.id, name = %removed.name, "student deleted");
                self.commit()
            }
            Command::ClearCurrentSemesters => {
                let student = self
                    .repo
                    .current_mut()
                    .ok_or(CommandError::NoCurrentStudent)?;
                student.semesters.clear();
                self.commit()
            }
            Command::ExportCurrentCsv => {
                let student = self.repo.current().ok_or(CommandError::NoCurrentStudent)?;
                let export = export::export(&student.snapshot()).map_err(CommandError::Export)?;
                Ok(Effect::Exported(export))
            }
        }
    }

    pub fn students(&self) -> &[Student] {
        self.repo.all()
    }

    pub fn current(&self) -> Option<&Student> {
        self.repo.current()
    }

    pub fn current_id(&self) -> Option<&StudentId> {
        self.repo.current_id()
    }

    /// True when the last save failed and memory holds changes the store
    /// does not.
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn create_student(&mut self, fields: StudentFields) {
        let student = Student::new(new_id(), fields);
        let id = student.id.clone();
        self.repo.add_and_select(student);
        info!(id = %id, "student added");
    }

    /// Save, then render. The snapshot (and so the overall CGPA) is built
    /// fresh from the mutated ledger before either happens.
    fn commit(&mut self) -> Result<Effect, CommandError> {
        let snapshot = self
            .repo
            .current()
            .map(Student::snapshot)
            .ok_or(CommandError::NoCurrentStudent)?;
        let save_error = self.persist();
        self.view.render(&snapshot);
        Ok(Effect::Rendered {
            snapshot,
            save_error,
        })
    }

    fn persist(&mut self) -> Option<PersistenceError> {
        match self.store.save(self.repo.all()) {
            Ok(()) => {
                self.unsaved = false;
                None
            }
            Err(err) => {
                warn!(error = %err, "save failed, keeping changes in memory");
                self.unsaved = true;
                Some(err)
            }
        }
    }

    fn notify(&mut self) -> Option<StudentSnapshot> {
        let snapshot = self.repo.current().map(Student::snapshot)?;
        self.view.render(&snapshot);
        Some(snapshot)
    }
}
