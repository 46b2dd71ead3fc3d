//! Btrieve CLI
//!
//! Command-line tools for legacy Btrieve data files.
//!
//! # Commands
//!
//! - `view` - Display the header, key definitions and records of each file
//! - `convert` - Write a `.json` export document next to each file

mod commands;
mod export;

use btrv_core::LoadOptions;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Btrieve v5/v6 file tools.
#[derive(Parser)]
#[command(name = "btrv")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Skip records whose variable-length data cannot be read
    #[arg(global = true, long)]
    allow_corrupted: bool,

    /// Stop on fragment chains that loop back on themselves
    #[arg(global = true, long)]
    detect_cycles: bool,

    /// Create missing files from their .VIR template
    #[arg(global = true, long)]
    template_fallback: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for `view`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Display file metadata and records
    View {
        /// Files to display
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Number of records to show
        #[arg(short, long, default_value = "0")]
        records: usize,
    },

    /// Export each file to a sibling .json document
    Convert {
        /// Files to convert
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show version information
    Version,
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions::new()
            .allow_corrupted_records(self.allow_corrupted)
            .detect_fragment_cycles(self.detect_cycles)
            .template_fallback(self.template_fallback)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let options = cli.load_options();
    match cli.command {
        Commands::View {
            files,
            format,
            records,
        } => commands::view::run(&files, &options, format, records)?,
        Commands::Convert { files } => {
            let converted = commands::convert::run(&files, &options);
            tracing::info!(converted, total = files.len(), "conversion finished");
        }
        Commands::Version => {
            println!("btrv CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("btrv core v{}", btrv_core::VERSION);
        }
    }

    Ok(())
}
