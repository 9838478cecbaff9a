//! Top-level dispatch from parsed CLI arguments to the terminal view or a
//! headless subcommand.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

use crate::cli::{Cli, CliCommand};
use crate::config::{AppConfig, StoreLocation};
use crate::db::SqliteStore;
use crate::logging::{init_logging, LogConfig, LogTarget};
use crate::models::{StudentId, StudentSnapshot};
use crate::session::{Command, Effect, LatestSnapshot, Session};
use crate::store::{MemoryStore, StudentStore};
use crate::ui::{run_app, App};

pub fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::resolve(&cli)?;
    config.prepare_dirs()?;

    let target = match cli.command {
        None => LogTarget::File(config.log_file.clone()),
        Some(_) => LogTarget::Stderr,
    };
    init_logging(&LogConfig::from_verbosity(config.verbosity, target))
        .context("failed to initialise logging")?;

    match &config.store {
        StoreLocation::Memory => dispatch(MemoryStore::new(), cli.command, &config),
        StoreLocation::File(path) => match SqliteStore::open(path) {
            Ok(store) => dispatch(store, cli.command, &config),
            Err(err) => {
                // Memory stays usable; the file is left alone so a newer build
                // can still read it.
                warn!(error = %err, path = %path.display(), "falling back to in-memory records");
                eprintln!("warning: {err}; records will not be saved this session");
                dispatch(MemoryStore::new(), cli.command, &config)
            }
        },
    }
}

fn dispatch<S: StudentStore>(
    store: S,
    command: Option<CliCommand>,
    config: &AppConfig,
) -> Result<()> {
    match command {
        None => {
            let session = Session::start(store, LatestSnapshot::default());
            let mut app = App::new(session, config.export_dir.clone());
            info!("starting terminal view");
            run_app(&mut app)
        }
        Some(CliCommand::List) => {
            let session = Session::open(store, |_: &StudentSnapshot| {});
            list(&session, &mut io::stdout().lock())
        }
        Some(CliCommand::Export { student, output }) => {
            let mut session = Session::open(store, |_: &StudentSnapshot| {});
            export(&mut session, student, output)
        }
    }
}

/// One line per student: id, name, branch, entry count, overall CGPA.
pub fn list<S, V, W>(session: &Session<S, V>, out: &mut W) -> Result<()>
where
    S: StudentStore,
    V: crate::session::View,
    W: Write,
{
    for student in session.students() {
        let snapshot = student.snapshot();
        writeln!(
            out,
            "{}\t{}\t{}\t{} semesters\t{}",
            snapshot.id,
            snapshot.name,
            snapshot.branch,
            snapshot.entries.len(),
            snapshot.overall_display()
        )
        .context("failed to write student list")?;
    }
    Ok(())
}

fn export<S, V>(
    session: &mut Session<S, V>,
    student: Option<String>,
    output: Option<PathBuf>,
) -> Result<()>
where
    S: StudentStore,
    V: crate::session::View,
{
    if let Some(id) = student {
        session
            .handle(Command::SelectStudent(StudentId::from(id)))
            .context("cannot export")?;
    }
    let export = match session.handle(Command::ExportCurrentCsv)? {
        Effect::Exported(export) => export,
        Effect::Rendered { .. } => return Err(anyhow!("export produced no CSV")),
    };

    match output {
        Some(path) => export.write_to(&path),
        None => io::stdout()
            .lock()
            .write_all(export.contents.as_bytes())
            .context("failed to write CSV to stdout"),
    }
}
