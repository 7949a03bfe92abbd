//! lend - Local-first lending catalog

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = lend_cli::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
