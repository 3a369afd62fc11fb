// src/main.rs

use clap::error::ErrorKind;
use clap::Parser;
use nvup::cli::Cli;
use std::process::ExitCode;
use tracing::error;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version short-circuit with success; anything else
            // is a validation failure
            let exit = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
            let _ = err.print();
            return exit;
        }
    };

    let config = cli.into_config();

    if let Err(e) = nvup::logging::init(&config.log_file) {
        eprintln!("could not open log file {}: {}", config.log_file.display(), e);
        return ExitCode::FAILURE;
    }

    match nvup::stages::run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
