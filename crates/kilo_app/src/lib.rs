// Shared entry-point plumbing for the kilo-deploy and kilo-decode binaries.

pub mod cli;
pub mod commands;

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use clap::error::ErrorKind;
use kilo_core::logging::init_logging;
use kilo_core::{LaunchpadConfig, classify_error};
use tracing::{debug, error};
use tracing_appender::non_blocking::WorkerGuard;

/// Parse the command line. Usage errors print and exit with status 1.
pub fn parse_or_exit<T: Parser>() -> T {
    match T::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            std::process::exit(code);
        }
    }
}

/// Load configuration and start logging. Keep the guard alive until exit.
pub fn bootstrap(config_path: Option<&Path>) -> Result<(LaunchpadConfig, WorkerGuard)> {
    let config = LaunchpadConfig::load(config_path)?;
    let guard = init_logging(&config)?;
    Ok((config, guard))
}

/// Print a command's output on stdout. The log file keeps a debug-level copy,
/// which the default console filter leaves out.
pub fn emit(output: &str) {
    debug!("\n{output}");
    println!("{output}");
}

/// Log a top-level failure and pick the process exit code.
pub fn fail(context: &str, err: &anyhow::Error) -> ExitCode {
    let classified = classify_error(err);
    error!(
        category = ?classified.category,
        severity = ?classified.severity,
        recoverable = classified.recoverable,
        "{context}: {err:#}"
    );
    eprintln!("{context}: {}", classified.user_message);
    ExitCode::FAILURE
}
