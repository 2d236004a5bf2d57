//! Conversion between [`Table`] and Arrow record batches.

use std::sync::Arc;

use chrono::DateTime;
use datafusion::arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array, StringArray,
    TimestampMicrosecondArray,
};
use datafusion::arrow::compute::cast;
use datafusion::arrow::datatypes::{
    DataType, Field, Float64Type, Int64Type, Schema, TimeUnit, TimestampMicrosecondType,
};
use datafusion::arrow::error::ArrowError;
use datafusion::arrow::record_batch::{RecordBatch, RecordBatchOptions};

use crate::error::{FinlensError, Result};
use crate::table::{Column, ColumnType, Table, Value, dedupe_headers};

/// Arrow type used to store a column of the given type.
fn arrow_type(column_type: ColumnType) -> DataType {
    match column_type {
        ColumnType::Integer => DataType::Int64,
        ColumnType::Float => DataType::Float64,
        ColumnType::Text => DataType::Utf8,
        ColumnType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
        ColumnType::Boolean => DataType::Boolean,
    }
}

/// Column type for an Arrow type coming back from the engine.
fn column_type_of(data_type: &DataType) -> ColumnType {
    match data_type {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => ColumnType::Integer,
        DataType::Float16
        | DataType::Float32
        | DataType::Float64
        | DataType::Decimal128(_, _)
        | DataType::Decimal256(_, _) => ColumnType::Float,
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => ColumnType::Timestamp,
        DataType::Boolean => ColumnType::Boolean,
        _ => ColumnType::Text,
    }
}

/// Build a single record batch holding the whole table.
pub(crate) fn table_to_batch(table: &Table) -> Result<RecordBatch> {
    let fields: Vec<Field> = table
        .columns()
        .iter()
        .map(|c| Field::new(c.name.as_str(), arrow_type(c.column_type), true))
        .collect();
    let arrays: Vec<ArrayRef> = table.columns().iter().map(column_to_array).collect();

    let options = RecordBatchOptions::new().with_row_count(Some(table.row_count()));
    RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)
        .map_err(arrow_error)
}

fn column_to_array(column: &Column) -> ArrayRef {
    let values = column.values();
    match column.column_type {
        ColumnType::Integer => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    Value::Integer(i) => Some(*i),
                    _ => None,
                })
                .collect::<Int64Array>(),
        ),
        ColumnType::Float => Arc::new(values.iter().map(Value::as_f64).collect::<Float64Array>()),
        ColumnType::Text => Arc::new(values.iter().map(Value::as_str).collect::<StringArray>()),
        ColumnType::Boolean => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    Value::Boolean(b) => Some(*b),
                    _ => None,
                })
                .collect::<BooleanArray>(),
        ),
        ColumnType::Timestamp => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    Value::Timestamp(ts) => Some(ts.and_utc().timestamp_micros()),
                    _ => None,
                })
                .collect::<TimestampMicrosecondArray>(),
        ),
    }
}

/// Collect query output into a new table.
///
/// `schema` supplies column names and types when the engine returns no batches.
pub(crate) fn batches_to_table(schema: &Schema, batches: &[RecordBatch]) -> Result<Table> {
    let names = dedupe_headers(schema.fields().iter().map(|f| f.name().as_str()));

    let mut columns = Vec::with_capacity(names.len());
    for (idx, (name, field)) in names.into_iter().zip(schema.fields().iter()).enumerate() {
        let column_type = column_type_of(field.data_type());
        let mut values = Vec::new();
        for batch in batches {
            let array = batch.column(idx);
            values.extend(array_to_values(array, column_type).map_err(arrow_error)?);
        }
        columns.push(Column::new(name, column_type, values));
    }

    Table::new(columns)
}

fn array_to_values(
    array: &ArrayRef,
    column_type: ColumnType,
) -> std::result::Result<Vec<Value>, ArrowError> {
    let array = cast(array, &arrow_type(column_type))?;
    let len = array.len();

    let values = match column_type {
        ColumnType::Integer => {
            let typed = array.as_primitive::<Int64Type>();
            (0..len)
                .map(|i| {
                    if typed.is_null(i) {
                        Value::Null
                    } else {
                        Value::Integer(typed.value(i))
                    }
                })
                .collect()
        }
        ColumnType::Float => {
            let typed = array.as_primitive::<Float64Type>();
            (0..len)
                .map(|i| {
                    if typed.is_null(i) {
                        Value::Null
                    } else {
                        Value::Float(typed.value(i))
                    }
                })
                .collect()
        }
        ColumnType::Timestamp => {
            let typed = array.as_primitive::<TimestampMicrosecondType>();
            (0..len)
                .map(|i| {
                    if typed.is_null(i) {
                        return Value::Null;
                    }
                    DateTime::from_timestamp_micros(typed.value(i))
                        .map(|dt| Value::Timestamp(dt.naive_utc()))
                        .unwrap_or(Value::Null)
                })
                .collect()
        }
        ColumnType::Boolean => {
            let typed = array.as_boolean();
            (0..len)
                .map(|i| {
                    if typed.is_null(i) {
                        Value::Null
                    } else {
                        Value::Boolean(typed.value(i))
                    }
                })
                .collect()
        }
        ColumnType::Text => {
            let typed = array.as_string::<i32>();
            (0..len)
                .map(|i| {
                    if typed.is_null(i) {
                        Value::Null
                    } else {
                        Value::Text(typed.value(i).to_string())
                    }
                })
                .collect()
        }
    };

    Ok(values)
}

fn arrow_error(e: ArrowError) -> FinlensError {
    FinlensError::QueryExecution(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_preserves_types_and_nulls() {
        let rows = vec![
            vec!["EC2", "3", "1.5", "2024-01-01", "true"],
            vec!["", "", "", "", ""],
        ];
        let table =
            Table::from_rows(&["service", "hours", "cost", "day", "active"], &rows).unwrap();

        let batch = table_to_batch(&table).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.schema().field(2).data_type(), &DataType::Float64);

        let back = batches_to_table(&batch.schema(), &[batch.clone()]).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_empty_schema_without_batches() {
        let schema = Schema::new(vec![Field::new("n", DataType::Int32, true)]);
        let table = batches_to_table(&schema, &[]).unwrap();
        assert_eq!(table.column_names(), vec!["n"]);
        assert_eq!(table.column("n").unwrap().column_type, ColumnType::Integer);
        assert!(table.is_empty());
    }

    #[test]
    fn test_table_without_columns() {
        let batch = table_to_batch(&Table::empty()).unwrap();
        assert_eq!(batch.num_columns(), 0);
        assert_eq!(batch.num_rows(), 0);
    }
}
