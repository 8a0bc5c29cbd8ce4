//! clockify-cli binary entry point.

use std::process::ExitCode;

fn main() -> ExitCode {
    clockify_cli::cli::run()
}
