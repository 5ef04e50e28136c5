//! Jarbird - publishing task graphs for JVM library builds

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = jarbird::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
