//! Typed, column-oriented tables.

mod value;

pub use value::{ColumnType, Value, is_null_token, parse_timestamp};

use std::collections::HashSet;
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::{FinlensError, Result};

/// A named column holding values of a single type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    values: Vec<Value>,
}

impl Column {
    /// Create a column from already typed values.
    ///
    /// Values that do not match `column_type` are coerced (or nulled).
    pub fn new(name: impl Into<String>, column_type: ColumnType, values: Vec<Value>) -> Self {
        let values = values
            .into_iter()
            .map(|v| v.coerce(column_type))
            .collect();
        Self {
            name: name.into(),
            column_type,
            values,
        }
    }

    /// Build a column from raw text cells, inferring its type.
    pub fn from_raw<S: AsRef<str>>(name: impl Into<String>, cells: &[S]) -> Self {
        let column_type = ColumnType::infer(cells.iter().map(|c| c.as_ref()));
        let values = cells
            .iter()
            .map(|c| Value::parse(c.as_ref(), column_type))
            .collect();
        Self {
            name: name.into(),
            column_type,
            values,
        }
    }

    /// A column of `len` nulls.
    pub fn nulls(name: impl Into<String>, column_type: ColumnType, len: usize) -> Self {
        Self {
            name: name.into(),
            column_type,
            values: vec![Value::Null; len],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, row: usize) -> Option<&Value> {
        self.values.get(row)
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    /// Same values under a different name.
    pub fn renamed(&self, name: impl Into<String>) -> Column {
        Column {
            name: name.into(),
            column_type: self.column_type,
            values: self.values.clone(),
        }
    }
}

/// An ordered set of equal-length, uniquely named columns.
///
/// Tables are never mutated in place; every transformation returns a new table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Create a table, checking that columns are equal length and uniquely named.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != expected) {
                return Err(FinlensError::Profiling(format!(
                    "column '{}' has {} values, expected {}",
                    bad.name,
                    bad.len(),
                    expected
                )));
            }
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(FinlensError::Profiling(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
        }

        Ok(Self { columns })
    }

    /// A table with no columns and no rows.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from row-major text cells, inferring each column's type.
    ///
    /// Every row must have exactly one cell per header. Duplicate headers are
    /// renamed `name.1`, `name.2`, ...
    pub fn from_rows<S: AsRef<str>>(headers: &[S], rows: &[Vec<S>]) -> Result<Self> {
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(FinlensError::Profiling(format!(
                    "row {} has {} cells, expected {}",
                    idx + 1,
                    row.len(),
                    headers.len()
                )));
            }
        }

        let names = dedupe_headers(headers.iter().map(|h| h.as_ref()));
        let columns = names
            .into_iter()
            .enumerate()
            .map(|(col_idx, name)| {
                let cells: Vec<&str> = rows.iter().map(|r| r[col_idx].as_ref()).collect();
                Column::from_raw(name, &cells)
            })
            .collect();

        Self::new(columns)
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Cells of one row, in column order.
    pub fn row(&self, index: usize) -> Option<Vec<&Value>> {
        if index >= self.row_count() {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[index]).collect())
    }

    /// The first `n` rows.
    pub fn head(&self, n: usize) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                column_type: c.column_type,
                values: c.values.iter().take(n).cloned().collect(),
            })
            .collect();
        Table { columns }
    }

    /// Keep only the named columns, in the given order.
    pub fn project<S: AsRef<str>>(&self, names: &[S]) -> Result<Table> {
        let columns = names
            .iter()
            .map(|name| {
                self.column(name.as_ref()).cloned().ok_or_else(|| {
                    FinlensError::Profiling(format!("unknown column '{}'", name.as_ref()))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Table::new(columns)
    }

    /// A new table with `column` appended.
    pub fn with_column(&self, column: Column) -> Result<Table> {
        let mut columns = self.columns.clone();
        columns.push(column);
        Table::new(columns)
    }

    /// Write the table as CSV with a header row. Nulls are written as empty cells.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(self.column_names())?;
        for row in 0..self.row_count() {
            out.write_record(self.columns.iter().map(|c| c.values[row].to_string()))?;
        }
        out.flush().map_err(|e| FinlensError::Io {
            path: "<csv writer>".into(),
            source: e,
        })?;
        Ok(())
    }
}

pub(crate) fn dedupe_headers<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::new();

    for header in headers {
        let base = header.trim().to_string();
        let mut name = base.clone();
        let mut suffix = 1;
        while seen.contains(&name) {
            name = format!("{base}.{suffix}");
            suffix += 1;
        }
        seen.insert(name.clone());
        names.push(name);
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&'static str]]) -> Vec<Vec<&'static str>> {
        data.iter().map(|r| r.to_vec()).collect()
    }

    #[test]
    fn test_from_rows_infers_types() {
        let table = Table::from_rows(
            &["service", "cost", "date"],
            &rows(&[&["EC2", "12.5", "2024-01-01"], &["S3", "3", "2024-01-02"]]),
        )
        .unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column("service").unwrap().column_type, ColumnType::Text);
        assert_eq!(table.column("cost").unwrap().column_type, ColumnType::Float);
        assert_eq!(table.column("date").unwrap().column_type, ColumnType::Timestamp);
        assert_eq!(table.column("cost").unwrap().get(1), Some(&Value::Float(3.0)));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = Table::from_rows(&["a", "b"], &rows(&[&["1", "2"], &["3"]])).unwrap_err();
        assert!(matches!(err, FinlensError::Profiling(_)));
    }

    #[test]
    fn test_duplicate_headers_renamed() {
        let table = Table::from_rows(&["cost", "cost", "cost"], &rows(&[&["1", "2", "3"]])).unwrap();
        assert_eq!(table.column_names(), vec!["cost", "cost.1", "cost.2"]);
    }

    #[test]
    fn test_unequal_columns_rejected() {
        let err = Table::new(vec![
            Column::new("a", ColumnType::Integer, vec![Value::Integer(1)]),
            Column::new("b", ColumnType::Integer, vec![]),
        ])
        .unwrap_err();
        assert!(matches!(err, FinlensError::Profiling(_)));
    }

    #[test]
    fn test_write_csv() {
        let table = Table::from_rows(&["a", "b"], &rows(&[&["1", ""], &["2", "x"]])).unwrap();
        let mut buf = Vec::new();
        table.write_csv(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "a,b\n1,\n2,x\n");
    }

    #[test]
    fn test_project_unknown_column() {
        let table = Table::from_rows(&["a"], &rows(&[&["1"]])).unwrap();
        assert!(table.project(&["missing"]).is_err());
        assert_eq!(table.project(&["a"]).unwrap().column_count(), 1);
    }
}
