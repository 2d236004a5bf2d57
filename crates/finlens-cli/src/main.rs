//! finlens CLI - cost-export analysis from the command line.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match commands::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Analyze { file, json } => commands::analyze::run(file, json, config),

        Commands::Merge {
            files,
            output,
            no_force,
        } => commands::merge::run(files, output, no_force, config),

        Commands::Query {
            files,
            sql,
            backend,
            limit,
            json,
        } => commands::query::run(files, sql, backend, limit, json, config),

        Commands::Stats { files, json } => commands::stats::run(files, json, config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
