//! CLI argument definitions using clap.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Assay: data-quality and statistics reports for tabular files
#[derive(Parser)]
#[command(name = "assay")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Summarize columns, statistics and parameter assessments
    Analyze(InputArgs),

    /// Report data quality issues
    Check(InputArgs),
}

/// Options shared by every command that reads a data file.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Path to the data file (CSV, JSON, or XLSX)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Built-in parameter registry for domain rules
    #[arg(long, value_enum, default_value = "soil")]
    pub domain: Domain,

    /// Load the parameter registry from a JSON file instead
    #[arg(long, value_name = "JSON", conflicts_with = "domain")]
    pub registry: Option<PathBuf>,

    /// Use a quote-aware CSV reader instead of plain comma splitting
    #[arg(long)]
    pub quoted_csv: bool,

    /// Match aliases as raw substrings of column names
    #[arg(long)]
    pub legacy_matching: bool,

    /// Print the report as JSON instead of Markdown
    #[arg(long)]
    pub json: bool,

    /// Number of sample rows to include
    #[arg(long, value_name = "N", default_value = "5")]
    pub rows: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Domain {
    /// Soil test parameters (pH, nutrients, texture)
    Soil,
    /// No domain rules; generic checks only
    Generic,
}
