//! Row-wise concatenation of tables.

use crate::error::Result;
use crate::table::{Column, ColumnType, Table, Value};

/// Stack `parts` row-wise over `columns`, in order.
///
/// Tables lacking a column contribute nulls. Each output column takes the type
/// of the first table holding a non-null value in it, widened to Float when
/// Integer meets Float; cells that do not fit the output type become null.
pub(crate) fn stack(parts: &[&Table], columns: &[String]) -> Result<Table> {
    let total_rows: usize = parts.iter().map(|t| t.row_count()).sum();

    let stacked = columns
        .iter()
        .map(|name| {
            let column_type = unified_type(parts, name);
            let mut values: Vec<Value> = Vec::with_capacity(total_rows);
            for part in parts {
                match part.column(name) {
                    Some(column) => values.extend(column.values().iter().cloned()),
                    None => values.extend(std::iter::repeat_n(Value::Null, part.row_count())),
                }
            }
            Column::new(name.clone(), column_type, values)
        })
        .collect();

    Table::new(stacked)
}

fn unified_type(parts: &[&Table], name: &str) -> ColumnType {
    let present: Vec<&Column> = parts.iter().filter_map(|t| t.column(name)).collect();

    // An all-null column carries no type information of its own
    present
        .iter()
        .filter(|c| c.null_count() < c.len())
        .map(|c| c.column_type)
        .reduce(ColumnType::unify)
        .or_else(|| present.first().map(|c| c.column_type))
        .unwrap_or(ColumnType::Text)
}
