use cgpa_tracker::db::{open_store, SCHEMA_VERSION, STUDENTS_KEY};
use cgpa_tracker::{
    Command, LatestSnapshot, PersistenceError, Session, SqliteStore, StudentFields, StudentStore,
};
use rusqlite::Connection;

#[test]
fn records_survive_reopening_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.sqlite");

    let expected = {
        let store = SqliteStore::open(&path).unwrap();
        let mut session = Session::start(store, LatestSnapshot::default());
        session
            .handle(Command::AddSemester { sem: 2, cgpa: 7.2 })
            .unwrap();
        session
            .handle(Command::AddStudent(StudentFields::new(
                "Asha",
                "IIT Madras",
                "EEE",
                "2020 - 2024",
            )))
            .unwrap();
        session
            .handle(Command::AddSemester { sem: 1, cgpa: 9.35 })
            .unwrap();
        session.students().to_vec()
    };

    let mut reopened = SqliteStore::open(&path).unwrap();
    assert_eq!(reopened.load(), expected);

    let session = Session::start(reopened, LatestSnapshot::default());
    let latest = session.view().latest().unwrap();
    assert_eq!(latest.name, "Siva Sai");
    assert_eq!(latest.overall_display(), "7.00");
}

#[test]
fn first_open_seeds_and_writes_versioned_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.sqlite");

    let session = Session::start(SqliteStore::open(&path).unwrap(), LatestSnapshot::default());
    assert!(!session.has_unsaved_changes());
    drop(session);

    let conn = Connection::open(&path).unwrap();
    let keys: Vec<String> = conn
        .prepare("SELECT key FROM app_state")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(keys, vec![STUDENTS_KEY.to_string()]);

    let version: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, SCHEMA_VERSION);
}

#[test]
fn newer_files_are_refused_and_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.sqlite");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(&format!("PRAGMA user_version = {}", SCHEMA_VERSION + 1))
            .unwrap();
    }

    let result = open_store(&path);
    assert!(matches!(
        result,
        Err(PersistenceError::UnsupportedVersion { found, .. }) if found == SCHEMA_VERSION + 1
    ));

    let conn = Connection::open(&path).unwrap();
    let tables: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE name = 'app_state'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(tables, 0);
}
