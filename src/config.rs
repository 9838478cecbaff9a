//! Runtime configuration resolved from the command line, environment and
//! home-directory defaults.

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cli::Cli;
use crate::db::default_db_path;

const LOG_FILE_NAME: &str = "cgpa-tracker.log";

/// Where the store lives. `Memory` backs `--ephemeral` runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub store: StoreLocation,
    pub export_dir: PathBuf,
    pub log_file: PathBuf,
    pub verbosity: u8,
}

impl AppConfig {
    /// Fill in whatever the CLI left unset. `--db` beats `--data-dir`, which
    /// beats `~/.cgpa-tracker/`.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let default_db = default_db_path()?;
        Self::resolve_with_default(cli, default_db)
    }

    fn resolve_with_default(cli: &Cli, default_db: PathBuf) -> Result<Self> {
        let db_path = match (&cli.db, &cli.data_dir) {
            (Some(db), _) => db.clone(),
            (None, Some(dir)) => dir.join(
                default_db
                    .file_name()
                    .context("default database path has no file name")?,
            ),
            (None, None) => default_db,
        };

        let data_dir = cli
            .data_dir
            .clone()
            .or_else(|| db_path.parent().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));

        let export_dir = match &cli.export_dir {
            Some(dir) => dir.clone(),
            None => env::current_dir().context("failed to read current directory")?,
        };

        let store = if cli.ephemeral {
            StoreLocation::Memory
        } else {
            StoreLocation::File(db_path)
        };

        Ok(Self {
            store,
            export_dir,
            log_file: data_dir.join(LOG_FILE_NAME),
            verbosity: cli.verbose,
        })
    }

    /// Create the directories the store and the log file need.
    pub fn prepare_dirs(&self) -> Result<()> {
        let mut dirs = Vec::new();
        if let StoreLocation::File(path) = &self.store {
            dirs.extend(path.parent());
        }
        dirs.extend(self.log_file.parent());
        for dir in dirs {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create data directory {}", dir.display()))?;
            }
        }
        Ok(())
    }
}
