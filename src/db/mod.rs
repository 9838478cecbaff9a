//! SQLite persistence split across logical submodules.

mod connection;
mod students;

pub use connection::{default_db_path, open_store, SCHEMA_VERSION};
pub use students::{load_students, save_students, SqliteStore, STUDENTS_KEY};
