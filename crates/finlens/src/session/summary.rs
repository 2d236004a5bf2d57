//! Headline figures for display.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::{ColumnRole, RoleAssignment};
use crate::table::{Column, Table, Value};

/// A single summary figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SummaryValue {
    Currency(f64),
    Total(f64),
    Average(f64),
    Count(usize),
    Top(Value),
}

impl fmt::Display for SummaryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryValue::Currency(v) if *v < 0.0 => write!(f, "-${}", group_thousands(-v, 2)),
            SummaryValue::Currency(v) => write!(f, "${}", group_thousands(*v, 2)),
            SummaryValue::Total(v) => f.write_str(&signed(*v, 0)),
            SummaryValue::Average(v) => f.write_str(&signed(*v, 2)),
            SummaryValue::Count(n) => write!(f, "{n}"),
            SummaryValue::Top(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub label: String,
    pub value: SummaryValue,
}

impl SummaryEntry {
    fn new(label: String, value: SummaryValue) -> Self {
        Self { label, value }
    }
}

/// Summary figures for a table.
///
/// Every cost column gets total, average and max; the first three metrics get
/// total and average; the first two dimensions get their distinct count, plus
/// the most frequent value when there are at most ten distinct values.
pub fn summarize(table: &Table, roles: &RoleAssignment) -> Vec<SummaryEntry> {
    let mut entries = Vec::new();

    for column in columns(table, roles, ColumnRole::Cost, usize::MAX) {
        let numbers = numbers(column);
        entries.push(SummaryEntry::new(
            format!("Total {}", column.name),
            SummaryValue::Currency(numbers.iter().sum()),
        ));
        entries.push(SummaryEntry::new(
            format!("Average {}", column.name),
            SummaryValue::Currency(mean(&numbers)),
        ));
        entries.push(SummaryEntry::new(
            format!("Max {}", column.name),
            SummaryValue::Currency(numbers.iter().copied().reduce(f64::max).unwrap_or(0.0)),
        ));
    }

    for column in columns(table, roles, ColumnRole::Metric, 3) {
        let numbers = numbers(column);
        entries.push(SummaryEntry::new(
            format!("Total {}", column.name),
            SummaryValue::Total(numbers.iter().sum()),
        ));
        entries.push(SummaryEntry::new(
            format!("Average {}", column.name),
            SummaryValue::Average(mean(&numbers)),
        ));
    }

    for column in columns(table, roles, ColumnRole::Dimension, 2) {
        let (unique, top) = distinct_and_top(column);
        entries.push(SummaryEntry::new(
            format!("Unique {}", column.name),
            SummaryValue::Count(unique),
        ));
        if let Some(top) = top.filter(|_| unique <= 10) {
            entries.push(SummaryEntry::new(
                format!("Top {}", column.name),
                SummaryValue::Top(top),
            ));
        }
    }

    entries
}

fn columns<'a>(
    table: &'a Table,
    roles: &RoleAssignment,
    role: ColumnRole,
    limit: usize,
) -> Vec<&'a Column> {
    roles
        .columns_with(role)
        .into_iter()
        .filter_map(|name| table.column(name))
        .take(limit)
        .collect()
}

fn numbers(column: &Column) -> Vec<f64> {
    column.values().iter().filter_map(Value::as_f64).collect()
}

fn mean(numbers: &[f64]) -> f64 {
    if numbers.is_empty() {
        0.0
    } else {
        numbers.iter().sum::<f64>() / numbers.len() as f64
    }
}

/// Distinct non-null count and the most frequent value (first seen wins ties).
fn distinct_and_top(column: &Column) -> (usize, Option<Value>) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<(String, &Value)> = Vec::new();
    for value in column.values().iter().filter(|v| !v.is_null()) {
        let key = value.distinct_key();
        let count = counts.entry(key.clone()).or_insert(0);
        if *count == 0 {
            order.push((key, value));
        }
        *count += 1;
    }

    let mut best: Option<(usize, &Value)> = None;
    for (key, value) in &order {
        let count = counts.get(key).copied().unwrap_or(0);
        if best.is_none_or(|(c, _)| count > c) {
            best = Some((count, *value));
        }
    }

    (order.len(), best.map(|(_, v)| v.clone()))
}

fn signed(value: f64, decimals: usize) -> String {
    if value < 0.0 {
        format!("-{}", group_thousands(-value, decimals))
    } else {
        group_thousands(value, decimals)
    }
}

/// Format a non-negative number with comma thousands separators.
fn group_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value);
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.iter().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*ch);
    }

    match frac_part {
        Some(frac) => format!("{grouped}.{frac}"),
        None => grouped,
    }
}
