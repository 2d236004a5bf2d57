//! Structural profile of a dataset.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::table::{ColumnType, Value};

/// Statistics for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    /// Column name.
    pub name: String,
    /// Inferred data type.
    pub inferred_type: ColumnType,
    /// Number of distinct non-null values.
    pub distinct_count: usize,
    /// Number of null/missing values.
    pub null_count: usize,
    /// Up to five representative values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sample_values: Vec<Value>,
}

/// Statistics for a whole table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub row_count: usize,
    pub column_count: usize,
    /// Per-column profiles, in column order.
    pub columns: Vec<ColumnProfile>,
    /// Columns whose names suggest dates or times.
    #[serde(default)]
    pub date_columns: Vec<String>,
}

impl DatasetProfile {
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.inferred_type.is_numeric())
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn text_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.inferred_type == ColumnType::Text)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Null counts keyed by column name.
    pub fn missing_values(&self) -> IndexMap<&str, usize> {
        self.columns
            .iter()
            .map(|c| (c.name.as_str(), c.null_count))
            .collect()
    }

    pub fn total_nulls(&self) -> usize {
        self.columns.iter().map(|c| c.null_count).sum()
    }
}
