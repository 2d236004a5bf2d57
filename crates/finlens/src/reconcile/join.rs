//! Full outer join on shared key columns.

use std::collections::HashMap;

use crate::error::{FinlensError, Result};
use crate::table::{Column, Table, Value};

/// Full outer join of `left` and `right` on `keys`.
///
/// Output columns are the left table's columns followed by the right table's
/// non-key columns. Non-key names must already be distinct between the two
/// sides. Keys compare by their text rendering, so `1` and `1.0` match; rows
/// with a null key never match anything. Left rows keep their order, each
/// followed by its matches in right-table order; unmatched right rows come last.
pub(crate) fn outer_join(left: &Table, right: &Table, keys: &[String]) -> Result<Table> {
    let left_keys = key_columns(left, keys)?;
    let right_keys = key_columns(right, keys)?;

    let mut index: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
    for row in 0..right.row_count() {
        if let Some(key) = row_key(&right_keys, row) {
            index.entry(key).or_default().push(row);
        }
    }

    let mut pairs: Vec<(Option<usize>, Option<usize>)> = Vec::new();
    let mut matched = vec![false; right.row_count()];
    for row in 0..left.row_count() {
        match row_key(&left_keys, row).and_then(|k| index.get(&k)) {
            Some(rows) => {
                for &other in rows {
                    matched[other] = true;
                    pairs.push((Some(row), Some(other)));
                }
            }
            None => pairs.push((Some(row), None)),
        }
    }
    pairs.extend(
        matched
            .iter()
            .enumerate()
            .filter(|(_, m)| !**m)
            .map(|(row, _)| (None, Some(row))),
    );

    let mut columns = Vec::with_capacity(left.column_count() + right.column_count());
    for column in left.columns() {
        let joined = match right.column(&column.name) {
            Some(other) if keys.contains(&column.name) => {
                let values = pairs
                    .iter()
                    .map(|pair| match *pair {
                        (Some(l), _) => column.values()[l].clone(),
                        (None, Some(r)) => other.values()[r].clone(),
                        (None, None) => Value::Null,
                    })
                    .collect();
                Column::new(
                    column.name.clone(),
                    column.column_type.unify(other.column_type),
                    values,
                )
            }
            _ => pick(column, pairs.iter().map(|(l, _)| *l)),
        };
        columns.push(joined);
    }
    for column in right.columns() {
        if !keys.contains(&column.name) {
            columns.push(pick(column, pairs.iter().map(|(_, r)| *r)));
        }
    }

    Table::new(columns)
}

fn key_columns<'a>(table: &'a Table, keys: &[String]) -> Result<Vec<&'a Column>> {
    keys.iter()
        .map(|key| {
            table.column(key).ok_or_else(|| {
                FinlensError::Profiling(format!("join key '{}' missing from table", key))
            })
        })
        .collect()
}

fn row_key(columns: &[&Column], row: usize) -> Option<Vec<String>> {
    columns
        .iter()
        .map(|c| match c.values().get(row) {
            Some(v) if !v.is_null() => Some(v.to_string()),
            _ => None,
        })
        .collect()
}

fn pick(column: &Column, rows: impl Iterator<Item = Option<usize>>) -> Column {
    let values = rows
        .map(|row| match row {
            Some(i) => column.values()[i].clone(),
            None => Value::Null,
        })
        .collect();
    Column::new(column.name.clone(), column.column_type, values)
}
