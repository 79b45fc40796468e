//! TimescaleDB unit manager CLI
//!
//! Entry point invoked by the orchestrator for each lifecycle event.

mod cli;
mod commands;
mod context;
mod error;
mod logging;
mod status_file;

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use context::Context;
use error::Result;

/// Exit code asking the orchestrator to redeliver the event (EX_TEMPFAIL)
const EXIT_DEFERRED: u8 = 75;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: logging disabled: {}", "warning".yellow().bold(), e);
    }
    tracing::debug!(?cli, "Parsed arguments");

    match &cli.command {
        Commands::Hook {
            event,
            options,
            json,
        } => {
            let ctx = Context::from_cli(&cli)?;
            let outcome = commands::run_hook(&ctx, (*event).into(), options, *json)?;
            if outcome.deferred() {
                Ok(ExitCode::from(EXIT_DEFERRED))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
        Commands::Status { json } => {
            let ctx = Context::from_cli(&cli)?;
            commands::run_status(&ctx, *json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::CheckOptions { options } => {
            commands::run_check_options(options)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
