//! Group-by aggregations and the suggestions offered for a table.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FinlensError, Result};
use crate::sandbox::guard::quote_ident;
use crate::schema::{ColumnRole, RoleAssignment};
use crate::table::{Column, ColumnType, Table, Value};

/// Largest number of suggestions returned.
pub const MAX_SUGGESTIONS: usize = 5;
/// Groups kept in an aggregation result.
pub const TOP_GROUPS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationKind {
    Sum,
    Mean,
    Count,
}

impl fmt::Display for AggregationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationKind::Sum => f.write_str("sum"),
            AggregationKind::Mean => f.write_str("mean"),
            AggregationKind::Count => f.write_str("count"),
        }
    }
}

/// One group-by aggregation.
///
/// The result has two columns, the group and the aggregate, sorted by the
/// aggregate descending (ties by group ascending) and cut to [`TOP_GROUPS`].
/// Rows with a null group are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationRequest {
    pub kind: AggregationKind,
    /// Column to aggregate. Ignored for counts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    pub group_by: String,
}

impl AggregationRequest {
    pub fn sum(metric: impl Into<String>, group_by: impl Into<String>) -> Self {
        Self {
            kind: AggregationKind::Sum,
            metric: Some(metric.into()),
            group_by: group_by.into(),
        }
    }

    pub fn mean(metric: impl Into<String>, group_by: impl Into<String>) -> Self {
        Self {
            kind: AggregationKind::Mean,
            metric: Some(metric.into()),
            group_by: group_by.into(),
        }
    }

    pub fn count(group_by: impl Into<String>) -> Self {
        Self {
            kind: AggregationKind::Count,
            metric: None,
            group_by: group_by.into(),
        }
    }

    /// Name of the aggregate column in the result.
    pub fn output_column(&self) -> String {
        match (self.kind, &self.metric) {
            (AggregationKind::Sum, Some(m)) => format!("total_{m}"),
            (AggregationKind::Mean, Some(m)) => format!("average_{m}"),
            _ => "count".to_string(),
        }
    }

    /// Check the request against a table and return the metric column, if any.
    pub(crate) fn validate<'a>(&self, table: &'a Table) -> Result<Option<&'a Column>> {
        if !table.has_column(&self.group_by) {
            return Err(unknown_column(&self.group_by));
        }
        if self.kind == AggregationKind::Count {
            return Ok(None);
        }

        let name = self.metric.as_deref().ok_or_else(|| {
            FinlensError::QueryExecution(format!("{} aggregation needs a metric column", self.kind))
        })?;
        let column = table.column(name).ok_or_else(|| unknown_column(name))?;
        if !column.column_type.is_numeric() {
            return Err(FinlensError::QueryExecution(format!(
                "cannot {} non-numeric column '{}'",
                self.kind, name
            )));
        }
        Ok(Some(column))
    }

    /// Equivalent SQL against `table_name`.
    pub(crate) fn to_sql(&self, table_name: &str) -> String {
        let group = quote_ident(&self.group_by);
        let alias = quote_ident(&self.output_column());
        let aggregate = match (self.kind, &self.metric) {
            (AggregationKind::Sum, Some(m)) => format!("SUM({})", quote_ident(m)),
            (AggregationKind::Mean, Some(m)) => format!("AVG({})", quote_ident(m)),
            _ => "COUNT(*)".to_string(),
        };
        format!(
            "SELECT {group}, {aggregate} AS {alias} FROM {table_name} \
             WHERE {group} IS NOT NULL GROUP BY {group} \
             ORDER BY {alias} DESC NULLS LAST, {group} ASC LIMIT {TOP_GROUPS}"
        )
    }

    /// Evaluate the aggregation in memory.
    pub(crate) fn evaluate(&self, table: &Table) -> Result<Table> {
        let metric = self.validate(table)?;
        let group = table
            .column(&self.group_by)
            .ok_or_else(|| unknown_column(&self.group_by))?;

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<(Value, Accumulator)> = Vec::new();
        for (row, key) in group.values().iter().enumerate() {
            if key.is_null() {
                continue;
            }
            let slot = *index.entry(key.distinct_key()).or_insert_with(|| {
                groups.push((key.clone(), Accumulator::default()));
                groups.len() - 1
            });
            let cell = metric.and_then(|m| m.get(row));
            groups[slot].1.add(cell);
        }

        let output_type = match (self.kind, metric) {
            (AggregationKind::Sum, Some(m)) => m.column_type,
            (AggregationKind::Mean, _) => ColumnType::Float,
            _ => ColumnType::Integer,
        };

        let mut rows: Vec<(Value, Value)> = groups
            .into_iter()
            .map(|(key, acc)| (key, acc.finish(self.kind, output_type)))
            .collect();
        rows.sort_by(|(ka, va), (kb, vb)| desc_nulls_last(va, vb).then_with(|| ka.sort_cmp(kb)));
        rows.truncate(TOP_GROUPS);

        let (keys, values): (Vec<Value>, Vec<Value>) = rows.into_iter().unzip();
        Table::new(vec![
            Column::new(group.name.clone(), group.column_type, keys),
            Column::new(self.output_column(), output_type, values),
        ])
    }
}

#[derive(Debug, Default)]
struct Accumulator {
    rows: i64,
    non_null: usize,
    int_sum: i64,
    float_sum: f64,
}

impl Accumulator {
    fn add(&mut self, cell: Option<&Value>) {
        self.rows += 1;
        match cell {
            Some(Value::Integer(i)) => {
                self.non_null += 1;
                self.int_sum = self.int_sum.wrapping_add(*i);
                self.float_sum += *i as f64;
            }
            Some(Value::Float(f)) => {
                self.non_null += 1;
                self.float_sum += f;
            }
            _ => {}
        }
    }

    fn finish(&self, kind: AggregationKind, output_type: ColumnType) -> Value {
        match kind {
            AggregationKind::Count => Value::Integer(self.rows),
            _ if self.non_null == 0 => Value::Null,
            AggregationKind::Sum if output_type == ColumnType::Integer => {
                Value::Integer(self.int_sum)
            }
            AggregationKind::Sum => Value::Float(self.float_sum),
            AggregationKind::Mean => Value::Float(self.float_sum / self.non_null as f64),
        }
    }
}

fn desc_nulls_last(a: &Value, b: &Value) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.sort_cmp(a),
    }
}

fn unknown_column(name: &str) -> FinlensError {
    FinlensError::QueryExecution(format!("unknown column '{name}'"))
}

/// A suggested aggregation with a short description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationSuggestion {
    pub request: AggregationRequest,
    pub description: String,
}

/// Aggregations worth running on a table with these roles.
///
/// Totals of the first cost column by each of the first three dimensions,
/// averages of the first two metrics by the first two dimensions, then row
/// counts by the first two dimensions; at most [`MAX_SUGGESTIONS`]. Tables
/// without dimensions get none.
pub fn suggest(roles: &RoleAssignment) -> Vec<AggregationSuggestion> {
    let dimensions = roles.columns_with(ColumnRole::Dimension);
    if dimensions.is_empty() {
        return Vec::new();
    }

    let mut suggestions = Vec::new();

    if let Some(cost) = roles.first(ColumnRole::Cost) {
        for dim in dimensions.iter().take(3) {
            suggestions.push(AggregationSuggestion {
                request: AggregationRequest::sum(cost, *dim),
                description: format!("Total {cost} by {dim}"),
            });
        }
    }

    for metric in roles.columns_with(ColumnRole::Metric).iter().take(2) {
        for dim in dimensions.iter().take(2) {
            suggestions.push(AggregationSuggestion {
                request: AggregationRequest::mean(*metric, *dim),
                description: format!("Average {metric} by {dim}"),
            });
        }
    }

    for dim in dimensions.iter().take(2) {
        suggestions.push(AggregationSuggestion {
            request: AggregationRequest::count(*dim),
            description: format!("Count of records by {dim}"),
        });
    }

    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}
