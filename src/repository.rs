//! In-memory student collection plus the "current student" cursor.
//!
//! The repository restores its own invariants: it is never empty once built,
//! and the cursor always names a student that exists. Removing the last
//! student re-seeds the default record right here instead of leaving that to
//! callers.

use tracing::info;

use crate::error::NotFound;
use crate::models::{Student, StudentFields, StudentId};

#[derive(Debug, Clone)]
pub struct StudentRepository {
    students: Vec<Student>,
    current: Option<StudentId>,
}

impl StudentRepository {
    /// Build from whatever the store returned. An empty collection is seeded
    /// and `seeded` reports whether that happened so the caller can persist it.
    pub fn from_loaded(students: Vec<Student>) -> (Self, bool) {
        let mut repo = Self {
            students,
            current: None,
        };
        let seeded = repo.ensure_seeded();
        if !seeded {
            repo.current = repo.students.first().map(|student| student.id.clone());
        }
        (repo, seeded)
    }

    /// Append a student. Ids come from the generator, so a blank or repeated
    /// id is a programming error rather than user input.
    pub fn add(&mut self, student: Student) {
        debug_assert!(!student.id.is_empty(), "student id must not be empty");
        debug_assert!(
            self.get(&student.id).is_none(),
            "student id {} already present",
            student.id
        );
        self.students.push(student);
    }

    /// Append a student and make it current.
    pub fn add_and_select(&mut self, student: Student) {
        self.current = Some(student.id.clone());
        self.add(student);
    }

    pub fn update(&mut self, id: &StudentId, fields: StudentFields) -> Result<(), NotFound> {
        let student = self.get_mut(id).ok_or_else(|| NotFound(id.clone()))?;
        student.apply(fields);
        Ok(())
    }

    /// Delete a student. When it was the current one the cursor falls back to
    /// the first remaining student; an emptied repository is re-seeded.
    pub fn remove(&mut self, id: &StudentId) -> Result<Student, NotFound> {
        let index = self
            .students
            .iter()
            .position(|student| &student.id == id)
            .ok_or_else(|| NotFound(id.clone()))?;
        let removed = self.students.remove(index);

        if !self.ensure_seeded() && self.current.as_ref() == Some(id) {
            self.current = self.students.first().map(|student| student.id.clone());
        }
        Ok(removed)
    }

    pub fn select(&mut self, id: &StudentId) -> Result<(), NotFound> {
        if self.get(id).is_none() {
            return Err(NotFound(id.clone()));
        }
        self.current = Some(id.clone());
        Ok(())
    }

    pub fn current(&self) -> Option<&Student> {
        self.current.as_ref().and_then(|id| self.get(id))
    }

    pub fn current_mut(&mut self) -> Option<&mut Student> {
        let id = self.current.clone()?;
        self.get_mut(&id)
    }

    pub fn current_id(&self) -> Option<&StudentId> {
        self.current.as_ref()
    }

    /// Students in insertion order.
    pub fn all(&self) -> &[Student] {
        &self.students
    }

    pub fn get(&self, id: &StudentId) -> Option<&Student> {
        self.students.iter().find(|student| &student.id == id)
    }

    fn get_mut(&mut self, id: &StudentId) -> Option<&mut Student> {
        self.students.iter_mut().find(|student| &student.id == id)
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    fn ensure_seeded(&mut self) -> bool {
        if !self.students.is_empty() {
            return false;
        }
        let seed = Student::seed();
        info!(id = %seed.id, "collection empty, seeding default student");
        self.current = Some(seed.id.clone());
        self.students.push(seed);
        true
    }
}
