//! CLI command implementations.

pub mod analyze;
pub mod merge;
pub mod query;
pub mod stats;

use std::path::{Path, PathBuf};

use colored::Colorize;
use finlens::{MergeOutcome, Session, SessionConfig, Table};

/// Read the session configuration, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<SessionConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
            Ok(SessionConfig::from_json_str(&json)?)
        }
        None => Ok(SessionConfig::default()),
    }
}

/// Build a session and load every file into it.
pub fn open_session(
    files: &[PathBuf],
    config: SessionConfig,
) -> Result<(Session, MergeOutcome), Box<dyn std::error::Error>> {
    for file in files {
        if !file.exists() {
            return Err(format!("File not found: {}", file.display()).into());
        }
    }

    let mut session = Session::with_config(config)?;
    let outcome = session.load_files(files)?;

    if files.len() > 1 {
        eprintln!(
            "{} {} files using {} ({} rows)",
            "Merged".cyan().bold(),
            files.len(),
            outcome.strategy.to_string().white().bold(),
            outcome.table.row_count()
        );
    }

    Ok((session, outcome))
}

/// Print a table as aligned text, truncated to `limit` rows.
pub fn print_table(table: &Table, limit: usize) {
    let names = table.column_names();
    let shown = table.row_count().min(limit);

    let mut widths: Vec<usize> = names.iter().map(|n| n.len()).collect();
    let rows: Vec<Vec<String>> = (0..shown)
        .filter_map(|i| table.row(i))
        .map(|row| row.iter().map(|v| v.to_string()).collect())
        .collect();
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count()).min(40);
        }
    }

    let header: Vec<String> = names
        .iter()
        .zip(&widths)
        .map(|(n, w)| format!("{:w$}", n, w = w))
        .collect();
    println!("{}", header.join("  ").bold());

    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:w$}", truncate(c, *w), w = w))
            .collect();
        println!("{}", cells.join("  "));
    }

    if table.row_count() > shown {
        println!(
            "{}",
            format!("... {} more rows", table.row_count() - shown).dimmed()
        );
    }
}

fn truncate(cell: &str, width: usize) -> String {
    if cell.chars().count() <= width {
        cell.to_string()
    } else {
        let mut s: String = cell.chars().take(width.saturating_sub(3)).collect();
        s.push_str("...");
        s
    }
}
