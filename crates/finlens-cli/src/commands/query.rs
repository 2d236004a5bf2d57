//! Query command - run read-only SQL against loaded exports.

use std::path::PathBuf;

use colored::Colorize;
use finlens::{Backend, SessionConfig};

use super::{open_session, print_table};
use crate::cli::BackendChoice;

pub fn run(
    files: Vec<PathBuf>,
    sql: String,
    backend: Option<BackendChoice>,
    limit: usize,
    json_output: bool,
    mut config: SessionConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(choice) = backend {
        config.backend = choice.into();
    }
    if let Some(note) = backend_note(config.backend) {
        eprintln!("{} {}", "Note:".yellow().bold(), note);
    }

    let (session, _) = open_session(&files, config)?;
    let result = match session.query(&sql) {
        Ok(table) => table,
        Err(e) if e.is_query_error() => {
            return Err(format!("{}\n{}", e, "The query was not run.".dimmed()).into());
        }
        Err(e) => return Err(e.into()),
    };

    if json_output {
        let rows: Vec<serde_json::Map<String, serde_json::Value>> = (0..result.row_count())
            .filter_map(|i| result.row(i))
            .map(|row| {
                result
                    .column_names()
                    .into_iter()
                    .zip(row)
                    .map(|(name, value)| Ok((name.to_string(), serde_json::to_value(value)?)))
                    .collect::<Result<_, serde_json::Error>>()
            })
            .collect::<Result<_, _>>()?;
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print_table(&result, limit);
        println!();
        println!(
            "{} row(s) via {} backend",
            result.row_count().to_string().white().bold(),
            session.backend()
        );
    }

    Ok(())
}

/// Warning shown before running a query on a backend that cannot execute it.
fn backend_note(backend: Backend) -> Option<&'static str> {
    match backend {
        Backend::Basic => Some(
            "the basic backend only checks the query against the denylist; \
             use --backend sql to run it",
        ),
        Backend::Sql => None,
    }
}
