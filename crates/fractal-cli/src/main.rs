//! Entry point for the `fractal` command-line tool.
//!
//! The binary delegates to [`fractal_cli::run`], which loads configuration,
//! registers the shipped controllers and dispatches the invocation.

use std::io::{self, IsTerminal, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let stdout_is_terminal = io::stdout().is_terminal();
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    fractal_cli::run(
        std::env::args_os(),
        &mut stdout,
        &mut stderr,
        stdout_is_terminal,
    )
}
