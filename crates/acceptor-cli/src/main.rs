//! Acceptor CLI: run storefront and booking API feature files
//!
//! ## Usage
//!
//! ```bash
//! acceptor run                          # every feature under ./features
//! acceptor run --tags @api              # booking API scenarios only
//! RUN_UI_TESTS=true acceptor run -v     # include browser scenarios
//! acceptor check features/              # report undefined steps
//! acceptor stub --port 3001             # local booking API
//! ```
//!
//! Exit status is 0 when everything passed, 1 when a scenario failed or a
//! step is undefined, and 2 on any other error.

use acceptor_cli::handlers::{execute_check, execute_run, execute_steps, execute_stub};
use acceptor_cli::{logging, Cli, CliConfig, CliError, CliResult, Commands, Verbosity};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}

fn run() -> CliResult<bool> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    logging::init(config.verbosity);

    match cli.command {
        Commands::Run(args) => runtime()?.block_on(execute_run(&config, &args)),
        Commands::Check(args) => execute_check(&config, &args),
        Commands::Steps(args) => execute_steps(&config, &args),
        Commands::Stub(args) => runtime()?
            .block_on(execute_stub(&config, &args))
            .map(|()| true),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.into())
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::config(format!("Failed to create runtime: {e}")))
}
