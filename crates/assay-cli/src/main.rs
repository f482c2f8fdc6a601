//! Assay CLI - data-quality and statistics reports for tabular files.

mod cli;
mod commands;
mod logging;
mod markdown;

use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Analyze(args) => commands::analyze::run(args),
        Commands::Check(args) => commands::check::run(args),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
