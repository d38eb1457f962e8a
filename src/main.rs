use clap::Parser;
use std::process::ExitCode;

use teslalog::TeslalogError;
use teslalog::cli::{Cli, Command};
use teslalog::config::{load_config, resolve_db_path};
use teslalog::{process, status};

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_target(false)
        .init();
}

fn run() -> Result<(), TeslalogError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let db_path = resolve_db_path(cli.db, &config);

    match cli.command {
        Command::Parse(args) => process::handle_parse(&args, cli.verbose, &db_path, &config),
        Command::Status => status::handle_status(&db_path),
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("teslalog: {e}");
            ExitCode::from(1)
        }
    }
}
