use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Student, StudentFields};

/// Internal representation of the student profile form.
#[derive(Default, Clone)]
pub(crate) struct StudentForm {
    pub(crate) name: String,
    pub(crate) college: String,
    pub(crate) branch: String,
    pub(crate) batch: String,
    pub(crate) active: StudentField,
    pub(crate) error: Option<String>,
}

/// Fields available within the student form, in tab order.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub(crate) enum StudentField {
    #[default]
    Name,
    College,
    Branch,
    Batch,
}

impl StudentField {
    pub(crate) const ALL: [StudentField; 4] = [
        StudentField::Name,
        StudentField::College,
        StudentField::Branch,
        StudentField::Batch,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            StudentField::Name => "Name",
            StudentField::College => "College",
            StudentField::Branch => "Branch",
            StudentField::Batch => "Batch",
        }
    }

    fn next(self) -> Self {
        match self {
            StudentField::Name => StudentField::College,
            StudentField::College => StudentField::Branch,
            StudentField::Branch => StudentField::Batch,
            StudentField::Batch => StudentField::Name,
        }
    }

    fn previous(self) -> Self {
        match self {
            StudentField::Name => StudentField::Batch,
            StudentField::College => StudentField::Name,
            StudentField::Branch => StudentField::College,
            StudentField::Batch => StudentField::Branch,
        }
    }
}

impl StudentForm {
    /// Populate the form from the current student when editing.
    pub(crate) fn from_student(student: &Student) -> Self {
        Self {
            name: student.name.clone(),
            college: student.college.clone(),
            branch: student.branch.clone(),
            batch: student.batch.clone(),
            active: StudentField::Name,
            error: None,
        }
    }

    pub(crate) fn next_field(&mut self) {
        self.active = self.active.next();
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = self.active.previous();
    }

    fn value(&self, field: StudentField) -> &String {
        match field {
            StudentField::Name => &self.name,
            StudentField::College => &self.college,
            StudentField::Branch => &self.branch,
            StudentField::Batch => &self.batch,
        }
    }

    fn value_mut(&mut self, field: StudentField) -> &mut String {
        match field {
            StudentField::Name => &mut self.name,
            StudentField::College => &mut self.college,
            StudentField::Branch => &mut self.branch,
            StudentField::Batch => &mut self.batch,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        let field = self.active;
        self.value_mut(field).push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        let field = self.active;
        self.value_mut(field).pop();
    }

    /// Trim every field and hand them to the session. Blank fields are left
    /// for the session to reject so the message matches the core's wording.
    pub(crate) fn to_fields(&self) -> StudentFields {
        StudentFields::new(
            self.name.trim(),
            self.college.trim(),
            self.branch.trim(),
            self.batch.trim(),
        )
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, field: StudentField) -> Line<'static> {
        build_field_line(
            field.label(),
            self.value(field),
            self.active == field,
        )
    }

    pub(crate) fn value_len(&self, field: StudentField) -> usize {
        self.value(field).chars().count()
    }
}

/// Form state for adding or updating one semester's CGPA.
#[derive(Default, Clone)]
pub(crate) struct SemesterForm {
    pub(crate) sem: String,
    pub(crate) cgpa: String,
    pub(crate) active: SemesterField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub(crate) enum SemesterField {
    #[default]
    Semester,
    Cgpa,
}

impl SemesterForm {
    /// Suggest the semester after the highest one recorded.
    pub(crate) fn with_semester(sem: u32) -> Self {
        Self {
            sem: sem.to_string(),
            active: SemesterField::Cgpa,
            ..Self::default()
        }
    }

    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            SemesterField::Semester => SemesterField::Cgpa,
            SemesterField::Cgpa => SemesterField::Semester,
        };
    }

    /// Digits only for the semester; digits and a single dot for the CGPA.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        match self.active {
            SemesterField::Semester => {
                if ch.is_ascii_digit() {
                    self.sem.push(ch);
                    true
                } else {
                    false
                }
            }
            SemesterField::Cgpa => {
                if ch.is_ascii_digit() || (ch == '.' && !self.cgpa.contains('.')) {
                    self.cgpa.push(ch);
                    true
                } else {
                    false
                }
            }
        }
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            SemesterField::Semester => {
                self.sem.pop();
            }
            SemesterField::Cgpa => {
                self.cgpa.pop();
            }
        }
    }

    /// Parse both inputs into numbers. Range checks belong to the ledger.
    pub(crate) fn parse_inputs(&self) -> Result<(i64, f64)> {
        let sem_raw = self.sem.trim();
        let cgpa_raw = self.cgpa.trim();
        if sem_raw.is_empty() || cgpa_raw.is_empty() {
            return Err(anyhow!("Please fill all fields."));
        }
        let sem = sem_raw
            .parse::<i64>()
            .map_err(|_| anyhow!("Semester must be a whole number."))?;
        let cgpa = cgpa_raw
            .parse::<f64>()
            .map_err(|_| anyhow!("CGPA must be a number."))?;
        Ok((sem, cgpa))
    }

    pub(crate) fn build_line(&self, field: SemesterField) -> Line<'static> {
        match field {
            SemesterField::Semester => {
                build_field_line("Semester", &self.sem, self.active == SemesterField::Semester)
            }
            SemesterField::Cgpa => {
                build_field_line("CGPA", &self.cgpa, self.active == SemesterField::Cgpa)
            }
        }
    }

    pub(crate) fn value_len(&self, field: SemesterField) -> usize {
        match field {
            SemesterField::Semester => self.sem.chars().count(),
            SemesterField::Cgpa => self.cgpa.chars().count(),
        }
    }
}

fn build_field_line(field_name: &str, value: &str, is_active: bool) -> Line<'static> {
    let display = if value.is_empty() {
        "<required>".to_string()
    } else {
        value.to_string()
    };

    let style = if is_active {
        Style::default().fg(Color::Yellow)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{field_name}: ")),
        Span::styled(display, style),
    ])
}

/// Pending destructive action awaiting a y/n answer.
#[derive(Clone, Debug)]
pub(crate) struct Confirm {
    pub(crate) action: ConfirmAction,
    pub(crate) student_name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ConfirmAction {
    DeleteStudent,
    ClearSemesters,
}

impl Confirm {
    pub(crate) fn prompt(&self) -> String {
        match self.action {
            ConfirmAction::DeleteStudent => {
                format!("Delete {} and all of their semesters?", self.student_name)
            }
            ConfirmAction::ClearSemesters => {
                format!("Clear every semester recorded for {}?", self.student_name)
            }
        }
    }
}
