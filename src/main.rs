//! toolspec - Specification documents for command-line tools

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = toolspec::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
