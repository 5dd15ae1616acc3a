//! CLI entrypoint for the Ponzu content-server tool.
//!
//! The binary delegates to [`ponzu_cli::run`], which loads configuration,
//! parses the command and either works on the project in the current
//! directory or hands control to the serving process.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Unlocked handles: `serve` never returns and its listener threads log to
    // stderr.
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    ponzu_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
