use std::cell::RefCell;
use std::rc::Rc;

use cgpa_tracker::{
    Command, CommandError, Effect, LatestSnapshot, MemoryStore, PersistenceError, Session,
    Student, StudentFields, StudentSnapshot, StudentStore, ValidationError,
};

/// Store whose writes can be switched off to simulate a full disk.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    failing: Rc<RefCell<bool>>,
}

impl StudentStore for FlakyStore {
    fn load(&mut self) -> Vec<Student> {
        self.inner.load()
    }

    fn save(&mut self, students: &[Student]) -> Result<(), PersistenceError> {
        if *self.failing.borrow() {
            return Err(PersistenceError::Write(rusqlite::Error::InvalidQuery));
        }
        self.inner.save(students)
    }
}

fn fresh() -> Session<MemoryStore, LatestSnapshot> {
    Session::start(MemoryStore::new(), LatestSnapshot::default())
}

fn overall(session: &Session<MemoryStore, LatestSnapshot>) -> String {
    session.view().latest().unwrap().overall_display()
}

fn fields(name: &str) -> StudentFields {
    StudentFields::new(name, "JNTU Kakinada", "ECE", "2023 - 2027")
}

#[test]
fn first_run_scenario() {
    let mut session = fresh();
    assert_eq!(session.students().len(), 1);
    let seeded = session.view().latest().unwrap();
    assert_eq!(seeded.name, "Siva Sai");
    assert_eq!(seeded.entries.len(), 1);
    assert_eq!(overall(&session), "6.80");

    session
        .handle(Command::AddSemester { sem: 2, cgpa: 7.2 })
        .unwrap();
    assert_eq!(overall(&session), "7.00");

    session
        .handle(Command::AddSemester { sem: 1, cgpa: 7.8 })
        .unwrap();
    let latest = session.view().latest().unwrap();
    assert_eq!(latest.entries.len(), 2);
    assert_eq!(latest.entries[0].sem, 1);
    assert_eq!(latest.entries[0].cgpa.to_string(), "7.80");
    assert_eq!(overall(&session), "7.50");
}

#[test]
fn seed_is_persisted_on_first_run() {
    let session = fresh();
    assert_eq!(session.store().saves(), 1);
    assert!(!session.has_unsaved_changes());
}

#[test]
fn open_seeds_in_memory_without_saving_or_rendering() {
    let session = Session::open(MemoryStore::new(), LatestSnapshot::default());
    assert_eq!(session.students().len(), 1);
    assert_eq!(session.store().saves(), 0);
    assert_eq!(session.view().renders(), 0);
    assert!(session.has_unsaved_changes());
}

#[test]
fn every_mutation_saves_then_renders() {
    let mut session = fresh();
    let renders = session.view().renders();
    let saves = session.store().saves();

    session
        .handle(Command::AddOrUpdateStudent(fields("Siva S")))
        .unwrap();
    session
        .handle(Command::AddSemester { sem: 3, cgpa: 9.0 })
        .unwrap();
    session.handle(Command::ClearCurrentSemesters).unwrap();

    assert_eq!(session.view().renders(), renders + 3);
    assert_eq!(session.store().saves(), saves + 3);
    let latest = session.view().latest().unwrap();
    assert_eq!(latest.name, "Siva S");
    assert!(latest.entries.is_empty());
    assert_eq!(latest.overall_display(), "0.00");
}

#[test]
fn add_or_update_edits_the_current_student() {
    let mut session = fresh();
    let id = session.current_id().cloned().unwrap();

    session
        .handle(Command::AddOrUpdateStudent(fields("Renamed")))
        .unwrap();

    assert_eq!(session.students().len(), 1);
    let current = session.current().unwrap();
    assert_eq!(current.id, id);
    assert_eq!(current.name, "Renamed");
    assert_eq!(current.semesters.len(), 1);
}

#[test]
fn add_student_creates_and_selects() {
    let mut session = fresh();
    let effect = session.handle(Command::AddStudent(fields("Asha"))).unwrap();

    assert_eq!(session.students().len(), 2);
    assert_eq!(effect.snapshot().unwrap().name, "Asha");
    assert_eq!(session.current().unwrap().name, "Asha");
    assert!(session.current().unwrap().semesters.is_empty());
}

#[test]
fn blank_fields_are_rejected_without_change() {
    let mut session = fresh();
    let before = session.students().to_vec();
    let renders = session.view().renders();

    let err = session
        .handle(Command::AddOrUpdateStudent(StudentFields::new(
            "Asha", "", "EEE", "2020",
        )))
        .unwrap_err();

    assert!(matches!(
        err,
        CommandError::Validation(ValidationError::EmptyField("College"))
    ));
    assert_eq!(session.students(), before.as_slice());
    assert_eq!(session.view().renders(), renders);
}

#[test]
fn invalid_semesters_leave_ledger_unchanged() {
    let mut session = fresh();
    let saves = session.store().saves();

    for (sem, cgpa) in [(0, 5.0), (2, 10.01), (2, -0.01)] {
        let err = session
            .handle(Command::AddSemester { sem, cgpa })
            .unwrap_err();
        assert!(matches!(err, CommandError::Validation(_)));
    }

    assert_eq!(session.current().unwrap().semesters.len(), 1);
    assert_eq!(session.store().saves(), saves);
}

#[test]
fn select_moves_cursor_without_saving() {
    let mut session = fresh();
    let seed_id = session.current_id().cloned().unwrap();
    session.handle(Command::AddStudent(fields("Asha"))).unwrap();
    let saves = session.store().saves();

    let effect = session
        .handle(Command::SelectStudent(seed_id.clone()))
        .unwrap();

    assert_eq!(effect.snapshot().unwrap().id, seed_id);
    assert_eq!(session.view().latest().unwrap().id, seed_id);
    assert_eq!(session.store().saves(), saves);
}

#[test]
fn selecting_unknown_student_is_not_found() {
    let mut session = fresh();
    let err = session
        .handle(Command::SelectStudent("id-ghost".into()))
        .unwrap_err();
    assert!(matches!(err, CommandError::NotFound(_)));
}

#[test]
fn deleting_last_student_reseeds() {
    let mut session = fresh();
    let original = session.current_id().cloned().unwrap();

    session.handle(Command::DeleteCurrentStudent).unwrap();

    assert_eq!(session.students().len(), 1);
    let current = session.current().unwrap();
    assert_ne!(current.id, original);
    assert_eq!(current.name, "Siva Sai");
    assert_eq!(session.current_id(), Some(&current.id));
}

#[test]
fn deleting_moves_cursor_to_first_remaining() {
    let mut session = fresh();
    let seed_id = session.current_id().cloned().unwrap();
    session.handle(Command::AddStudent(fields("Asha"))).unwrap();
    session.handle(Command::AddStudent(fields("Ravi"))).unwrap();

    session.handle(Command::DeleteCurrentStudent).unwrap();

    assert_eq!(session.students().len(), 2);
    assert_eq!(session.current_id(), Some(&seed_id));
}

#[test]
fn export_is_pure() {
    let mut session = fresh();
    session
        .handle(Command::AddSemester { sem: 2, cgpa: 7.2 })
        .unwrap();
    let saves = session.store().saves();
    let renders = session.view().renders();

    let effect = session.handle(Command::ExportCurrentCsv).unwrap();
    let Effect::Exported(export) = effect else {
        panic!("expected an export");
    };

    assert_eq!(export.file_name, "Siva_Sai_cgpa.csv");
    assert_eq!(export.contents, "Semester,CGPA\n1,6.80\n2,7.20\n");
    assert_eq!(session.store().saves(), saves);
    assert_eq!(session.view().renders(), renders);
}

#[test]
fn failed_save_still_renders_and_retries_next_time() {
    let failing = Rc::new(RefCell::new(false));
    let store = FlakyStore {
        inner: MemoryStore::new(),
        failing: Rc::clone(&failing),
    };
    let rendered: Rc<RefCell<Vec<StudentSnapshot>>> = Rc::default();
    let sink = Rc::clone(&rendered);
    let mut session = Session::start(store, move |snapshot: &StudentSnapshot| {
        sink.borrow_mut().push(snapshot.clone())
    });

    *failing.borrow_mut() = true;
    let effect = session
        .handle(Command::AddSemester { sem: 2, cgpa: 9.0 })
        .unwrap();
    assert!(effect.save_error().is_some());
    assert!(session.has_unsaved_changes());
    assert_eq!(rendered.borrow().last().unwrap().entries.len(), 2);
    assert_eq!(session.current().unwrap().semesters.len(), 2);

    *failing.borrow_mut() = false;
    let effect = session
        .handle(Command::AddSemester { sem: 3, cgpa: 8.0 })
        .unwrap();
    assert!(effect.save_error().is_none());
    assert!(!session.has_unsaved_changes());

    let mut reloaded = session.store().inner.clone();
    let persisted = reloaded.load();
    assert_eq!(persisted[0].semesters.len(), 3);
}

#[test]
fn restart_restores_collection_and_selects_first() {
    let mut session = fresh();
    session.handle(Command::AddStudent(fields("Asha"))).unwrap();
    session
        .handle(Command::AddSemester { sem: 1, cgpa: 8.4 })
        .unwrap();
    let saved = session.students().to_vec();

    let store = session.store().clone();
    let restarted = Session::start(store, LatestSnapshot::default());

    assert_eq!(restarted.students(), saved.as_slice());
    assert_eq!(restarted.current_id(), Some(&saved[0].id));
}

#[test]
fn corrupt_storage_falls_back_to_seed() {
    let session = Session::start(
        MemoryStore::with_document("[{\"id\": 12}"),
        LatestSnapshot::default(),
    );
    assert_eq!(session.students().len(), 1);
    assert_eq!(session.current().unwrap().name, "Siva Sai");
}
