//! Core library for the CGPA tracker.
//!
//! The data model (`models`, `ledger`, `aggregate`, `repository`) knows
//! nothing about storage or terminals. `session` ties it to a `StudentStore`
//! and a `View`; `db` and `ui` are the concrete SQLite and ratatui pieces the
//! binary wires together.
pub mod aggregate;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod id;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod repository;
pub mod session;
pub mod store;
pub mod ui;

pub use aggregate::{format_cgpa, overall};
pub use db::SqliteStore;
pub use error::{CommandError, NotFound, PersistenceError, ValidationError};
pub use ledger::Ledger;
pub use models::{Cgpa, SemesterEntry, Student, StudentFields, StudentId, StudentSnapshot};
pub use repository::StudentRepository;
pub use session::{Command, Effect, LatestSnapshot, Session, View};
pub use store::{MemoryStore, StudentStore};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
