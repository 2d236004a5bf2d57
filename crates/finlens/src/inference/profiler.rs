//! Structural statistics for a table.

use std::collections::HashMap;

use crate::schema::{ColumnProfile, DatasetProfile};
use crate::table::{Column, Table, Value};

/// Name fragments that mark a column as date/time-like.
pub const DATE_NAME_HINTS: &[&str] = &["date", "time", "timestamp", "created", "modified"];

/// Columns with at most this many distinct values list them as samples.
const LOW_CARDINALITY: usize = 10;
/// Samples kept for low-cardinality columns.
const MAX_DISTINCT_SAMPLES: usize = 5;
/// Most-frequent values kept for high-cardinality columns.
const TOP_FREQUENT_SAMPLES: usize = 3;

/// Computes [`DatasetProfile`]s.
#[derive(Debug, Clone, Default)]
pub struct Profiler {
    /// Profile only the first N rows (None = all rows).
    sample_rows: Option<usize>,
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict profiling to the first `rows` rows.
    pub fn with_sample_rows(rows: Option<usize>) -> Self {
        Self { sample_rows: rows }
    }

    /// Profile a table. Never fails; the empty table yields a zero-row profile.
    pub fn profile(&self, table: &Table) -> DatasetProfile {
        let sampled;
        let table = match self.sample_rows {
            Some(n) if n < table.row_count() => {
                sampled = table.head(n);
                &sampled
            }
            _ => table,
        };

        let columns: Vec<ColumnProfile> = table.columns().iter().map(profile_column).collect();

        let date_columns = table
            .columns()
            .iter()
            .filter(|c| is_date_name(&c.name))
            .map(|c| c.name.clone())
            .collect();

        DatasetProfile {
            row_count: table.row_count(),
            column_count: table.column_count(),
            columns,
            date_columns,
        }
    }
}

/// Profile a whole table with default settings.
pub fn profile(table: &Table) -> DatasetProfile {
    Profiler::new().profile(table)
}

pub(crate) fn is_date_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    DATE_NAME_HINTS.iter().any(|hint| lower.contains(hint))
}

fn profile_column(column: &Column) -> ColumnProfile {
    // Distinct non-null values with their count and first position
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let mut distinct: Vec<&Value> = Vec::new();
    let mut null_count = 0;

    for value in column.values() {
        if value.is_null() {
            null_count += 1;
            continue;
        }
        let next_position = distinct.len();
        let entry = counts.entry(value.distinct_key()).or_insert((0, next_position));
        if entry.0 == 0 {
            distinct.push(value);
        }
        entry.0 += 1;
    }

    let distinct_count = distinct.len();
    let sample_values = if distinct_count <= LOW_CARDINALITY {
        distinct
            .iter()
            .take(MAX_DISTINCT_SAMPLES)
            .map(|v| (*v).clone())
            .collect()
    } else {
        let mut ranked: Vec<(usize, usize, &Value)> = distinct
            .iter()
            .map(|v| {
                let (count, first) = counts[&v.distinct_key()];
                (count, first, *v)
            })
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        ranked
            .into_iter()
            .take(TOP_FREQUENT_SAMPLES)
            .map(|(_, _, v)| v.clone())
            .collect()
    };

    ColumnProfile {
        name: column.name.clone(),
        inferred_type: column.column_type,
        distinct_count,
        null_count,
        sample_values,
    }
}
