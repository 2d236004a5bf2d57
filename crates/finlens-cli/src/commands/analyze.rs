//! Analyze command - profile an export and classify its columns.

use std::path::PathBuf;

use colored::Colorize;
use finlens::{ColumnRole, SessionConfig};

use super::open_session;

pub fn run(
    file: PathBuf,
    json_output: bool,
    config: SessionConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let (session, _) = open_session(std::slice::from_ref(&file), config)?;
    let analysis = session.analyze()?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Analyzing".cyan().bold(),
        file.display().to_string().white()
    );
    println!();
    println!("Service:   {}", analysis.service.display_name().white().bold());
    println!("File type: {}", analysis.source.display_name().white().bold());
    println!(
        "Shape:     {} rows x {} columns",
        analysis.profile.row_count.to_string().white().bold(),
        analysis.profile.column_count
    );

    println!();
    println!("{}", "Columns:".yellow().bold());
    for col in &analysis.profile.columns {
        let role = match analysis.roles.role_of(&col.name) {
            Some(role @ ColumnRole::Cost) => role.as_str().green(),
            Some(role @ ColumnRole::Identifier) => role.as_str().blue(),
            Some(role) => role.as_str().normal(),
            None => "-".normal(),
        };
        let nulls = if col.null_count > 0 {
            format!("{} nulls", col.null_count).red()
        } else {
            "".normal()
        };
        println!(
            "  {:28} {:10} {:12} {:>8} distinct  {}",
            col.name,
            col.inferred_type.to_string(),
            role,
            col.distinct_count,
            nulls
        );
    }

    if !analysis.profile.date_columns.is_empty() {
        println!();
        println!(
            "Date columns: {}",
            analysis.profile.date_columns.join(", ").cyan()
        );
    }

    Ok(())
}
