//! Stats command - headline statistics and suggested aggregations.

use std::path::PathBuf;

use colored::Colorize;
use finlens::SessionConfig;

use super::open_session;

pub fn run(
    files: Vec<PathBuf>,
    json_output: bool,
    config: SessionConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let (session, _) = open_session(&files, config)?;
    let stats = session.stats()?;
    let summary = session.summary()?;
    let suggestions = session.suggestions();

    if json_output {
        let status = serde_json::json!({
            "stats": stats,
            "summary": summary,
            "suggestions": suggestions.iter().map(|s| &s.description).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!(
        "Total rows: {}",
        stats.total_rows.to_string().white().bold()
    );

    match &stats.cost {
        Some(cost) => {
            println!();
            println!("{} {}", "Cost:".yellow().bold(), cost.column.cyan());
            println!("  total   {:>14.2}", cost.total);
            println!("  average {:>14.2}", cost.average);
            println!("  max     {:>14.2}", cost.max);
            println!("  min     {:>14.2}", cost.min);
        }
        None => println!("{}", "No cost column detected".dimmed()),
    }

    for dimension in &stats.top_dimensions {
        println!();
        println!("{} {}", "Top".yellow().bold(), dimension.column.cyan());
        for (value, count) in &dimension.values {
            let label = if value.is_null() {
                "(null)".to_string()
            } else {
                value.to_string()
            };
            println!("  {:30} {:>8}", label, count);
        }
    }

    if !summary.is_empty() {
        println!();
        println!("{}", "Summary:".yellow().bold());
        for entry in &summary {
            println!("  {:40} {}", entry.label, entry.value.to_string().white().bold());
        }
    }

    if !suggestions.is_empty() {
        println!();
        println!("{}", "Suggested aggregations:".yellow().bold());
        for suggestion in &suggestions {
            println!("  - {}", suggestion.description);
        }
    }

    Ok(())
}
