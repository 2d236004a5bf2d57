//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use finlens::Backend;

/// finlens: profile, reconcile and query cloud cost exports
#[derive(Parser)]
#[command(name = "finlens")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Session configuration file (JSON)
    #[arg(long, global = true, value_name = "CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Profile a cost export and classify its columns
    Analyze {
        /// Path to the export (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Reconcile several exports into one table
    Merge {
        /// Exports to combine
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Write the merged table here as CSV (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fail instead of falling back to a force merge
        #[arg(long)]
        no_force: bool,
    },

    /// Run a read-only SQL query against the loaded exports
    Query {
        /// Exports to load (merged if more than one)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// SQL to run; the table is named after the sandbox configuration
        #[arg(short, long)]
        sql: String,

        /// Query backend (basic only validates the query)
        #[arg(long)]
        backend: Option<BackendChoice>,

        /// Maximum rows to print
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show headline statistics and suggested aggregations
    Stats {
        /// Exports to load (merged if more than one)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum BackendChoice {
    Basic,
    Sql,
}

impl From<BackendChoice> for Backend {
    fn from(choice: BackendChoice) -> Self {
        match choice {
            BackendChoice::Basic => Backend::Basic,
            BackendChoice::Sql => Backend::Sql,
        }
    }
}
