//! Command-line surface. With no subcommand the terminal view starts; the
//! subcommands are headless helpers that print to stdout.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "cgpa-tracker", version, about = "Track semester CGPA for one or more students")]
pub struct Cli {
    /// Directory holding the record store and the log file.
    #[arg(long, global = true, env = "CGPA_TRACKER_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Explicit database file; overrides the one inside the data directory.
    #[arg(long, global = true, env = "CGPA_TRACKER_DB", value_name = "FILE")]
    pub db: Option<PathBuf>,

    /// Where CSV exports from the terminal view are written.
    #[arg(long, global = true, env = "CGPA_TRACKER_EXPORT_DIR", value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Keep everything in memory; nothing is written to disk.
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// List every student with their overall CGPA.
    List,
    /// Print one student's semesters as CSV.
    Export {
        /// Student id; defaults to the first student.
        #[arg(long)]
        student: Option<String>,
        /// Write to this file instead of stdout.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_export_with_flags() {
        let cli = Cli::try_parse_from([
            "cgpa-tracker",
            "-vv",
            "export",
            "--student",
            "id-abc",
            "--output",
            "out.csv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Some(CliCommand::Export { student, output }) => {
                assert_eq!(student.as_deref(), Some("id-abc"));
                assert_eq!(output, Some(PathBuf::from("out.csv")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_means_interactive() {
        let cli = Cli::try_parse_from(["cgpa-tracker", "--ephemeral"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.ephemeral);
    }
}
