//! Merge command - reconcile several exports into one table.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use colored::Colorize;
use finlens::SessionConfig;

use super::open_session;

pub fn run(
    files: Vec<PathBuf>,
    output: Option<PathBuf>,
    no_force: bool,
    mut config: SessionConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    if no_force {
        config.reconcile.allow_force_merge = false;
    }

    let (session, outcome) = open_session(&files, config)?;

    match output {
        Some(path) => {
            let file = File::create(&path)
                .map_err(|e| format!("Cannot create {}: {}", path.display(), e))?;
            session.export_csv(BufWriter::new(file))?;

            eprintln!(
                "{} {} ({} rows x {} columns)",
                "Saved to".green().bold(),
                path.display().to_string().white(),
                outcome.table.row_count(),
                outcome.table.column_count()
            );
            if !outcome.join_keys.is_empty() {
                eprintln!("Join keys: {}", outcome.join_keys.join(", ").cyan());
            }
        }
        None => session.export_csv(std::io::stdout().lock())?,
    }

    Ok(())
}
