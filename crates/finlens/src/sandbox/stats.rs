//! Headline statistics for the managed table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::schema::{ColumnRole, RoleAssignment};
use crate::table::{Column, Table, Value};

/// Dimension columns broken down in [`TableStats`].
pub const TOP_DIMENSIONS: usize = 3;
/// Values kept per dimension breakdown.
pub const TOP_VALUES: usize = 5;

/// Aggregates over the first cost column. Missing aggregates are reported as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostStats {
    pub column: String,
    pub total: f64,
    pub average: f64,
    pub max: f64,
    pub min: f64,
}

/// Most frequent values of one dimension column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionBreakdown {
    pub column: String,
    /// Value and row count, by count descending then value ascending (nulls last).
    pub values: Vec<(Value, usize)>,
}

/// Row count, cost aggregates and top dimension values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStats {
    pub total_rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<CostStats>,
    pub top_dimensions: Vec<DimensionBreakdown>,
}

impl TableStats {
    /// Compute the statistics in memory.
    pub fn compute(table: &Table, roles: &RoleAssignment) -> TableStats {
        let cost = roles
            .first(ColumnRole::Cost)
            .and_then(|name| table.column(name))
            .map(cost_stats);

        let top_dimensions = roles
            .columns_with(ColumnRole::Dimension)
            .into_iter()
            .take(TOP_DIMENSIONS)
            .filter_map(|name| table.column(name))
            .map(breakdown)
            .collect();

        TableStats {
            total_rows: table.row_count(),
            cost,
            top_dimensions,
        }
    }
}

fn cost_stats(column: &Column) -> CostStats {
    let numbers: Vec<f64> = column.values().iter().filter_map(Value::as_f64).collect();
    let total: f64 = numbers.iter().sum();
    let average = if numbers.is_empty() {
        0.0
    } else {
        total / numbers.len() as f64
    };
    let max = numbers.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let min = numbers.iter().copied().reduce(f64::min).unwrap_or(0.0);

    CostStats {
        column: column.name.clone(),
        total,
        average,
        max,
        min,
    }
}

fn breakdown(column: &Column) -> DimensionBreakdown {
    let mut counts: HashMap<String, (Value, usize)> = HashMap::new();
    for value in column.values() {
        counts
            .entry(value.distinct_key())
            .or_insert_with(|| (value.clone(), 0))
            .1 += 1;
    }

    let mut values: Vec<(Value, usize)> = counts.into_values().collect();
    values.sort_by(|(va, ca), (vb, cb)| cb.cmp(ca).then_with(|| va.sort_cmp(vb)));
    values.truncate(TOP_VALUES);

    DimensionBreakdown {
        column: column.name.clone(),
        values,
    }
}
