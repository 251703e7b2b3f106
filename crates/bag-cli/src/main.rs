//! bag-config CLI
//!
//! Reads node attributes the way a recipe would, with data bag overrides
//! applied.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let logging = if cli.verbose {
        bag_core::logging::init_at("debug")
    } else {
        bag_core::logging::init("info")
    };
    logging.map_err(|e| CliError::user(format!("Failed to set up logging: {e}")))?;
    tracing::debug!("Verbose mode enabled");

    match cli.command {
        Commands::Get { key, resolve, json } => commands::run_get(&resolve, &key, json),
        Commands::Describe { resolve, json } => commands::run_describe(&resolve, json),
    }
}
