//! Binary entry point: parse arguments, then hand off to the library, which
//! resolves configuration, starts logging, opens the record store and runs
//! either the terminal view or a headless subcommand.
use clap::Parser;

use cgpa_tracker::cli::Cli;

fn main() -> anyhow::Result<()> {
    cgpa_tracker::commands::run(Cli::parse())
}
