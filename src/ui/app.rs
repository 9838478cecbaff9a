use std::mem;
use std::path::PathBuf;

use anyhow::Result;
use crossterm::event::KeyCode;
use open::that as open_path;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Axis, Block, Borders, Chart, Clear, Dataset, GraphType, List, ListItem, ListState, Paragraph,
    Row, Table, Wrap,
};
use ratatui::Frame;

use crate::aggregate::format_cgpa;
use crate::error::CommandError;
use crate::models::StudentSnapshot;
use crate::session::{Command, Effect, LatestSnapshot, Session};
use crate::store::StudentStore;

use super::forms::{
    Confirm, ConfirmAction, SemesterField, SemesterForm, StudentField, StudentForm,
};
use super::helpers::{
    centered_rect, next_semester, surface_error, trend_points, trend_x_bounds, TREND_Y_BOUNDS,
};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Width share of the student list column.
const LIST_PERCENT: u16 = 30;

/// Fine-grained modes layered over the single dashboard screen.
enum Mode {
    Normal,
    EditingStudent(StudentForm),
    AddingStudent(StudentForm),
    AddingSemester(SemesterForm),
    Confirming(Confirm),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

enum StatusKind {
    Info,
    Warning,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Warning => Style::default().fg(Color::Yellow),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Terminal front-end state. Every data change goes through the session;
/// the app only keeps what the terminal needs (mode, status, export paths).
pub struct App<S: StudentStore> {
    session: Session<S, LatestSnapshot>,
    export_dir: PathBuf,
    mode: Mode,
    status: Option<StatusMessage>,
    last_export: Option<PathBuf>,
}

impl<S: StudentStore> App<S> {
    pub fn new(session: Session<S, LatestSnapshot>, export_dir: PathBuf) -> Self {
        let mut app = Self {
            session,
            export_dir,
            mode: Mode::Normal,
            status: None,
            last_export: None,
        };
        if app.session.has_unsaved_changes() {
            app.set_status(
                "Could not save to disk; changes are kept in memory.",
                StatusKind::Warning,
            );
        }
        app
    }

    /// Route a key press to the active mode. Returns `true` when the user asked
    /// to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::EditingStudent(form) => self.handle_student_form(code, form, false),
            Mode::AddingStudent(form) => self.handle_student_form(code, form, true),
            Mode::AddingSemester(form) => self.handle_semester_form(code, form),
            Mode::Confirming(confirm) => self.handle_confirm(code, confirm),
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => *exit = true,
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Char('e') | KeyCode::Char('E') => {
                if let Some(student) = self.session.current() {
                    let form = StudentForm::from_student(student);
                    self.clear_status();
                    return Ok(Mode::EditingStudent(form));
                }
                self.set_status("No student selected to edit.", StatusKind::Error);
            }
            KeyCode::Char('n') | KeyCode::Char('N') => {
                self.clear_status();
                return Ok(Mode::AddingStudent(StudentForm::default()));
            }
            KeyCode::Char('+') | KeyCode::Char('a') | KeyCode::Char('A') => {
                let next = self
                    .snapshot()
                    .map_or(1, |snapshot| next_semester(&snapshot.entries));
                self.clear_status();
                return Ok(Mode::AddingSemester(SemesterForm::with_semester(next)));
            }
            KeyCode::Char('-') | KeyCode::Char('d') | KeyCode::Char('D') => {
                return Ok(self.confirm(ConfirmAction::DeleteStudent));
            }
            KeyCode::Char('c') | KeyCode::Char('C') => {
                return Ok(self.confirm(ConfirmAction::ClearSemesters));
            }
            KeyCode::Char('x') | KeyCode::Char('X') => self.export_current(),
            KeyCode::Char('o') | KeyCode::Char('O') => self.open_last_export(),
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_student_form(&mut self, code: KeyCode, mut form: StudentForm, adding: bool) -> Mode {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => {
                let fields = form.to_fields();
                let (command, done) = if adding {
                    (Command::AddStudent(fields), "Student added.")
                } else {
                    (Command::AddOrUpdateStudent(fields), "Student saved.")
                };
                match self.run(command, done) {
                    Ok(()) => keep_open = false,
                    Err(message) => form.error = Some(message),
                }
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        match (keep_open, adding) {
            (false, _) => Mode::Normal,
            (true, true) => Mode::AddingStudent(form),
            (true, false) => Mode::EditingStudent(form),
        }
    }

    fn handle_semester_form(&mut self, code: KeyCode, mut form: SemesterForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => {
                let parsed = form.parse_inputs();
                match parsed {
                    Ok((sem, cgpa)) => {
                        match self.run(Command::AddSemester { sem, cgpa }, "CGPA added.") {
                            Ok(()) => return Mode::Normal,
                            Err(message) => form.error = Some(message),
                        }
                    }
                    Err(err) => {
                        let message = surface_error(&err);
                        self.set_status(message.clone(), StatusKind::Error);
                        form.error = Some(message);
                    }
                }
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::AddingSemester(form)
    }

    fn handle_confirm(&mut self, code: KeyCode, confirm: Confirm) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                let (command, done) = match confirm.action {
                    ConfirmAction::DeleteStudent => {
                        (Command::DeleteCurrentStudent, "Student deleted.")
                    }
                    ConfirmAction::ClearSemesters => {
                        (Command::ClearCurrentSemesters, "Cleared.")
                    }
                };
                match self.run(command, done) {
                    Ok(()) => Mode::Normal,
                    Err(_) => Mode::Confirming(confirm),
                }
            }
            _ => Mode::Confirming(confirm),
        }
    }

    fn confirm(&mut self, action: ConfirmAction) -> Mode {
        match self.session.current() {
            Some(student) => {
                let student_name = student.name.clone();
                self.clear_status();
                Mode::Confirming(Confirm {
                    action,
                    student_name,
                })
            }
            None => {
                self.set_status("No student selected.", StatusKind::Error);
                Mode::Normal
            }
        }
    }

    /// Dispatch a command and translate the outcome into a status line. The
    /// error text is handed back so forms can show it inline.
    fn run(&mut self, command: Command, done: &str) -> std::result::Result<(), String> {
        match self.session.handle(command) {
            Ok(effect) => {
                self.report_effect(&effect, done);
                Ok(())
            }
            Err(err) => Err(self.report_error(&err)),
        }
    }

    fn report_effect(&mut self, effect: &Effect, done: &str) {
        match effect.save_error() {
            Some(err) => self.set_status(
                format!("{done} Not saved to disk: {err}"),
                StatusKind::Warning,
            ),
            None => self.set_status(done, StatusKind::Info),
        }
    }

    fn report_error(&mut self, err: &CommandError) -> String {
        let message = err.to_string();
        self.set_status(message.clone(), StatusKind::Error);
        message
    }

    fn move_selection(&mut self, offset: isize) {
        let students = self.session.students();
        if students.is_empty() {
            return;
        }
        let current = self
            .session
            .current_id()
            .and_then(|id| students.iter().position(|student| &student.id == id))
            .unwrap_or(0);
        let last = students.len() as isize - 1;
        let target = (current as isize + offset).clamp(0, last) as usize;
        if target == current {
            return;
        }
        let id = students[target].id.clone();
        if let Err(err) = self.session.handle(Command::SelectStudent(id)) {
            self.report_error(&err);
        } else {
            self.clear_status();
        }
    }

    fn export_current(&mut self) {
        let export = match self.session.handle(Command::ExportCurrentCsv) {
            Ok(Effect::Exported(export)) => export,
            Ok(_) => return,
            Err(err) => {
                self.report_error(&err);
                return;
            }
        };
        match export.write_to_dir(&self.export_dir) {
            Ok(path) => {
                self.set_status(
                    format!("CSV saved to {}. Press 'o' to open it.", path.display()),
                    StatusKind::Info,
                );
                self.last_export = Some(path);
            }
            Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
        }
    }

    fn open_last_export(&mut self) {
        match self.last_export.clone() {
            None => self.set_status("Nothing exported yet. Press 'x' first.", StatusKind::Error),
            Some(path) => match open_path(&path) {
                Ok(()) => self.set_status(format!("Opened {}.", path.display()), StatusKind::Info),
                Err(err) => {
                    self.set_status(format!("Failed to open export: {err}"), StatusKind::Error)
                }
            },
        }
    }

    fn snapshot(&self) -> Option<&StudentSnapshot> {
        self.session.view().latest()
    }

    fn set_status<T: Into<String>>(&mut self, text: T, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(LIST_PERCENT),
                Constraint::Percentage(100 - LIST_PERCENT),
            ])
            .split(content_area);

        self.draw_student_list(frame, columns[0]);
        match self.snapshot() {
            Some(snapshot) => self.draw_dashboard(frame, columns[1], snapshot),
            None => {
                let message = Paragraph::new("No student selected.")
                    .alignment(Alignment::Center)
                    .block(Block::default().borders(Borders::ALL));
                frame.render_widget(message, columns[1]);
            }
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::EditingStudent(form) => self.draw_student_form(frame, area, "Edit Student", form),
            Mode::AddingStudent(form) => self.draw_student_form(frame, area, "New Student", form),
            Mode::AddingSemester(form) => self.draw_semester_form(frame, area, form),
            Mode::Confirming(confirm) => self.draw_confirm(frame, area, confirm),
            Mode::Normal => {}
        }
    }

    fn draw_student_list(&self, frame: &mut Frame, area: Rect) {
        let students = self.session.students();
        let items: Vec<ListItem> = students
            .iter()
            .map(|student| ListItem::new(student.to_string()))
            .collect();
        let selected = self
            .session
            .current_id()
            .and_then(|id| students.iter().position(|student| &student.id == id));

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Students"))
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(selected);
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_dashboard(&self, frame: &mut Frame, area: Rect, snapshot: &StudentSnapshot) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Percentage(40),
                Constraint::Min(8),
            ])
            .split(area);

        self.draw_profile(frame, rows[0], snapshot);
        self.draw_ledger(frame, rows[1], snapshot);
        self.draw_trend(frame, rows[2], snapshot);
    }

    fn draw_profile(&self, frame: &mut Frame, area: Rect, snapshot: &StudentSnapshot) {
        let label = Style::default().fg(Color::Gray);
        let lines = vec![
            Line::from(Span::styled(
                snapshot.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!("{} • {} • {}", snapshot.college, snapshot.branch, snapshot.batch),
                label,
            )),
            Line::from(vec![
                Span::styled("Overall CGPA: ", label),
                Span::styled(
                    snapshot.overall_display(),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
        ];
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Profile"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn draw_ledger(&self, frame: &mut Frame, area: Rect, snapshot: &StudentSnapshot) {
        let block = Block::default().borders(Borders::ALL).title("Semesters");
        if snapshot.entries.is_empty() {
            let message = Paragraph::new("No semesters yet. Press '+' to add one.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let rows: Vec<Row> = snapshot
            .entries
            .iter()
            .map(|entry| {
                Row::new(vec![
                    entry.sem.to_string(),
                    format_cgpa(entry.cgpa.value()),
                ])
            })
            .collect();
        let header = Row::new(vec!["Semester", "CGPA"])
            .style(Style::default().add_modifier(Modifier::BOLD));
        let table = Table::new(rows, [Constraint::Length(10), Constraint::Length(8)])
            .header(header)
            .block(block);
        frame.render_widget(table, area);
    }

    fn draw_trend(&self, frame: &mut Frame, area: Rect, snapshot: &StudentSnapshot) {
        let points = trend_points(&snapshot.entries);
        let [x_min, x_max] = trend_x_bounds(&snapshot.entries);
        let x_labels: Vec<String> = snapshot
            .entries
            .iter()
            .map(|entry| format!("S{}", entry.sem))
            .collect();
        let y_labels = vec!["0".to_string(), "5".to_string(), "10".to_string()];

        let dataset = Dataset::default()
            .name("CGPA")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Blue))
            .data(&points);

        let chart = Chart::new(vec![dataset])
            .block(Block::default().borders(Borders::ALL).title("Trend"))
            .x_axis(
                Axis::default()
                    .title("Semester")
                    .style(Style::default().fg(Color::Gray))
                    .bounds([x_min, x_max])
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .title("CGPA")
                    .style(Style::default().fg(Color::Gray))
                    .bounds(TREND_Y_BOUNDS)
                    .labels(y_labels),
            );
        frame.render_widget(chart, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let keys: &[(&str, &str)] = match &self.mode {
            Mode::Normal => &[
                ("[↑↓]", " Student   "),
                ("[n]", " New   "),
                ("[e]", " Edit   "),
                ("[+]", " Add CGPA   "),
                ("[c]", " Clear   "),
                ("[d]", " Delete   "),
                ("[x]", " Export CSV   "),
                ("[q]", " Quit"),
            ],
            Mode::Confirming(_) => &[("[y]", " Confirm   "), ("[n]", " Cancel")],
            _ => &[
                ("[Tab]", " Next field   "),
                ("[Enter]", " Save   "),
                ("[Esc]", " Cancel"),
            ],
        };
        let spans: Vec<Span<'static>> = keys
            .iter()
            .flat_map(|(key, label)| {
                [
                    Span::styled(key.to_string(), key_style),
                    Span::raw(label.to_string()),
                ]
            })
            .collect();
        Line::from(spans)
    }

    fn draw_student_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &StudentForm) {
        let popup_area = centered_rect(60, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = StudentField::ALL
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));
        lines.push(form_hint(form.error.as_deref()));

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        let row = StudentField::ALL
            .iter()
            .position(|field| *field == form.active)
            .unwrap_or(0) as u16;
        let prefix = format!("{}: ", form.active.label()).len() as u16;
        frame.set_cursor_position((
            inner.x + prefix + form.value_len(form.active) as u16,
            inner.y + row,
        ));
    }

    fn draw_semester_form(&self, frame: &mut Frame, area: Rect, form: &SemesterForm) {
        let popup_area = centered_rect(50, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Add CGPA").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            form.build_line(SemesterField::Semester),
            form.build_line(SemesterField::Cgpa),
            Line::from(""),
            form_hint(form.error.as_deref()),
        ];
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        let (prefix, row) = match form.active {
            SemesterField::Semester => ("Semester: ".len() as u16, 0),
            SemesterField::Cgpa => ("CGPA: ".len() as u16, 1),
        };
        frame.set_cursor_position((
            inner.x + prefix + form.value_len(form.active) as u16,
            inner.y + row,
        ));
    }

    fn draw_confirm(&self, frame: &mut Frame, area: Rect, confirm: &Confirm) {
        let popup_area = centered_rect(50, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Confirm").borders(Borders::ALL);
        let lines = vec![
            Line::from(confirm.prompt()),
            Line::from(""),
            Line::from(Span::styled(
                "y to confirm • n or Esc to cancel",
                Style::default().fg(Color::Gray),
            )),
        ];
        let paragraph = Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);
    }
}

fn form_hint(error: Option<&str>) -> Line<'static> {
    match error {
        Some(error) => Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(Span::styled(
            "Enter to save • Tab to switch • Esc to cancel",
            Style::default().fg(Color::Gray),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn app() -> App<MemoryStore> {
        let session = Session::start(MemoryStore::new(), LatestSnapshot::default());
        App::new(session, std::env::temp_dir())
    }

    fn type_text(app: &mut App<MemoryStore>, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
    }

    #[test]
    fn adding_a_semester_through_the_form_updates_overall() {
        let mut app = app();
        app.handle_key(KeyCode::Char('+')).unwrap();
        type_text(&mut app, "7.2");
        app.handle_key(KeyCode::Enter).unwrap();

        assert!(matches!(app.mode, Mode::Normal));
        let snapshot = app.snapshot().unwrap();
        assert_eq!(snapshot.entries.len(), 2);
        assert_eq!(snapshot.overall_display(), "7.00");
    }

    #[test]
    fn out_of_range_cgpa_keeps_form_open() {
        let mut app = app();
        app.handle_key(KeyCode::Char('+')).unwrap();
        type_text(&mut app, "11");
        app.handle_key(KeyCode::Enter).unwrap();

        match &app.mode {
            Mode::AddingSemester(form) => assert!(form.error.is_some()),
            _ => panic!("form should stay open"),
        }
        assert_eq!(app.snapshot().unwrap().entries.len(), 1);
    }

    #[test]
    fn new_student_form_creates_and_selects() {
        let mut app = app();
        app.handle_key(KeyCode::Char('n')).unwrap();
        for (index, value) in ["Asha", "IIT", "EEE", "2020 - 2024"].iter().enumerate() {
            if index > 0 {
                app.handle_key(KeyCode::Tab).unwrap();
            }
            type_text(&mut app, value);
        }
        app.handle_key(KeyCode::Enter).unwrap();

        assert_eq!(app.session.students().len(), 2);
        assert_eq!(app.snapshot().unwrap().name, "Asha");

        app.handle_key(KeyCode::Up).unwrap();
        assert_eq!(app.snapshot().unwrap().name, "Siva Sai");
    }

    #[test]
    fn delete_requires_confirmation() {
        let mut app = app();
        let original = app.snapshot().unwrap().id.clone();
        app.handle_key(KeyCode::Char('d')).unwrap();
        app.handle_key(KeyCode::Char('n')).unwrap();
        assert_eq!(app.snapshot().unwrap().id, original);

        app.handle_key(KeyCode::Char('d')).unwrap();
        app.handle_key(KeyCode::Char('y')).unwrap();
        let reseeded = app.snapshot().unwrap();
        assert_ne!(reseeded.id, original);
        assert_eq!(reseeded.name, "Siva Sai");
    }

    #[test]
    fn quit_key_exits() {
        let mut app = app();
        assert!(app.handle_key(KeyCode::Char('q')).unwrap());
    }
}
