//! CLI module — command line interface definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// seqdrill — catalogs a sequencing-pipeline output tree: file types,
/// exact duplicates, and regenerable intermediates.
#[derive(Parser, Debug)]
#[command(name = "seqdrill")]
#[command(author = "Ryan Cashmoney <tunclon@proton.me>")]
#[command(version)]
#[command(about = "Catalogs a sequencing-pipeline output tree", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a directory tree and produce a report
    Scan(ScanArgs),
}

#[derive(clap::Args, Debug)]
pub struct ScanArgs {
    /// Root directory to scan
    pub root: PathBuf,

    /// Write the report as JSON to this path instead of printing a summary
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Include mismatches outside the bio-format vocabulary
    #[arg(long)]
    pub include_non_bio_mismatches: bool,

    /// Disable strict mode
    #[arg(long)]
    pub no_strict: bool,

    /// Override the Tier 2 streaming hash chunk size, in bytes
    #[arg(long, value_name = "BYTES")]
    pub chunk_size_bytes: Option<usize>,
}
