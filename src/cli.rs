use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "teslalog",
    version,
    about = "Summarize Tesla poller logs into charge, drive and standby episodes"
)]
pub struct Cli {
    /// Database path
    #[arg(long, env = "TESLALOG_DB", global = true)]
    pub db: Option<PathBuf>,

    /// Config file (default: $TESLALOG_CONFIG or ~/.teslalog/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increasing levels of verbosity (-v records, -vv polls, -vvv offline)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Read poller output and print one summary line per episode
    Parse(ParseArgs),
    /// Show database health: size, counts, last record per vehicle
    Status,
}

#[derive(Parser)]
pub struct ParseArgs {
    /// Do not print summary information
    #[arg(long)]
    pub nosummary: bool,

    /// Insert records into the database instead of summarizing them
    #[arg(long)]
    pub store: bool,

    /// Also copy input lines into daily files in this directory
    #[arg(long)]
    pub outdir: Option<PathBuf>,

    /// Follow this file after the positional files
    #[arg(long, short)]
    pub follow: Option<PathBuf>,

    /// Lines of history to read when following (default 10)
    #[arg(long, short)]
    pub numlines: Option<usize>,

    /// Poller output files, processed in order
    pub files: Vec<PathBuf>,
}
