//! Strategy selection and the merge entry point.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::join::outer_join;
use super::stack::stack;
use crate::error::{MergeError, Result};
use crate::inference::classify_source;
use crate::input::NamedTable;
use crate::table::{Column, ColumnType, Table, Value};

/// Columns that may serve as join keys, in preference order.
pub const JOIN_KEY_CANDIDATES: &[&str] = &[
    "date",
    "service",
    "region",
    "resource_id",
    "instance_id",
    "volume_id",
    "bucket_name",
    "month",
];

const SOURCE_FILE_COLUMN: &str = "_source_file";
const FILE_TYPE_COLUMN: &str = "_file_type";

/// Reconciliation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Shared columns required for the common-columns strategy.
    pub min_common_columns: usize,
    /// Fall back to stacking everything when no other strategy applies.
    pub allow_force_merge: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            min_common_columns: 2,
            allow_force_merge: true,
        }
    }
}

/// How the inputs were combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Only one input; returned unchanged.
    SingleTable,
    /// Every input has the same column names.
    IdenticalSchema,
    /// Inputs share enough columns to stack on the shared ones.
    CommonColumns,
    /// Inputs were joined on shared key columns.
    KeyJoin,
    /// Everything stacked, with provenance columns.
    ForceMerge,
}

impl MergeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeStrategy::SingleTable => "single table",
            MergeStrategy::IdenticalSchema => "identical schema",
            MergeStrategy::CommonColumns => "common columns",
            MergeStrategy::KeyJoin => "key join",
            MergeStrategy::ForceMerge => "force merge",
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub table: Table,
    pub strategy: MergeStrategy,
    /// Columns present in every input, in first-input order.
    pub common_columns: Vec<String>,
    /// Keys used by the key-join strategy; empty otherwise.
    pub join_keys: Vec<String>,
}

/// Combines several tables into one.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationEngine {
    config: ReconcileConfig,
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ReconcileConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Merge the inputs with the first strategy that applies.
    ///
    /// Inputs are never modified; the outcome holds a new table.
    pub fn merge(&self, inputs: &[NamedTable]) -> Result<MergeOutcome> {
        let (first, rest) = inputs.split_first().ok_or(MergeError::NoInput)?;

        if rest.is_empty() {
            return Ok(MergeOutcome {
                table: first.table.clone(),
                strategy: MergeStrategy::SingleTable,
                common_columns: first.table.column_names().iter().map(|s| s.to_string()).collect(),
                join_keys: Vec::new(),
            });
        }

        let tables: Vec<&Table> = inputs.iter().map(|i| &i.table).collect();
        let common = common_columns(&tables);

        let outcome = if same_column_set(&tables) {
            let columns = owned_names(first.table.column_names());
            MergeOutcome {
                table: stack(&tables, &columns)?,
                strategy: MergeStrategy::IdenticalSchema,
                common_columns: common,
                join_keys: Vec::new(),
            }
        } else if common.len() >= self.config.min_common_columns.max(1) {
            MergeOutcome {
                table: stack(&tables, &common)?,
                strategy: MergeStrategy::CommonColumns,
                common_columns: common,
                join_keys: Vec::new(),
            }
        } else if let Some(keys) = join_keys(&common) {
            MergeOutcome {
                table: key_join(inputs, &keys)?,
                strategy: MergeStrategy::KeyJoin,
                common_columns: common,
                join_keys: keys,
            }
        } else if self.config.allow_force_merge {
            MergeOutcome {
                table: force_merge(inputs, common.is_empty())?,
                strategy: MergeStrategy::ForceMerge,
                common_columns: common,
                join_keys: Vec::new(),
            }
        } else {
            let files = inputs.iter().map(|i| i.filename.clone()).collect();
            log::warn!("no merge strategy applies to {:?}", files);
            return Err(MergeError::NoStrategy { files }.into());
        };

        log::info!(
            "merged {} files with {} strategy: {} rows x {} columns",
            inputs.len(),
            outcome.strategy,
            outcome.table.row_count(),
            outcome.table.column_count()
        );

        Ok(outcome)
    }
}

/// Merge with the default configuration.
pub fn merge(inputs: &[NamedTable]) -> Result<MergeOutcome> {
    ReconciliationEngine::new().merge(inputs)
}

fn owned_names(names: Vec<&str>) -> Vec<String> {
    names.into_iter().map(String::from).collect()
}

fn same_column_set(tables: &[&Table]) -> bool {
    let Some((first, rest)) = tables.split_first() else {
        return true;
    };
    let reference: HashSet<&str> = first.column_names().into_iter().collect();
    rest.iter().all(|t| {
        let names: HashSet<&str> = t.column_names().into_iter().collect();
        names == reference
    })
}

fn common_columns(tables: &[&Table]) -> Vec<String> {
    let Some((first, rest)) = tables.split_first() else {
        return Vec::new();
    };
    first
        .column_names()
        .into_iter()
        .filter(|name| rest.iter().all(|t| t.has_column(name)))
        .map(String::from)
        .collect()
}

fn join_keys(common: &[String]) -> Option<Vec<String>> {
    let keys: Vec<String> = JOIN_KEY_CANDIDATES
        .iter()
        .filter(|candidate| common.iter().any(|c| c == *candidate))
        .map(|candidate| candidate.to_string())
        .collect();
    if keys.is_empty() { None } else { Some(keys) }
}

fn key_join(inputs: &[NamedTable], keys: &[String]) -> Result<Table> {
    // Non-key columns in more than one input get a per-file suffix
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for input in inputs {
        for name in input.table.column_names() {
            if !keys.iter().any(|k| k == name) {
                *seen.entry(name).or_default() += 1;
            }
        }
    }

    // Names that stay as they are; suffixed names must not collide with them
    let mut taken: HashSet<String> = inputs
        .iter()
        .flat_map(|input| input.table.column_names())
        .filter(|name| seen.get(name).is_none_or(|count| *count <= 1))
        .map(String::from)
        .collect();

    let stems = file_stems(inputs);
    let mut renamed: Vec<Table> = Vec::with_capacity(inputs.len());
    for (input, stem) in inputs.iter().zip(&stems) {
        let columns = input
            .table
            .columns()
            .iter()
            .map(|c| match seen.get(c.name.as_str()) {
                Some(count) if *count > 1 => {
                    c.renamed(unique_name(&format!("{}_{}", c.name, stem), &mut taken))
                }
                _ => c.clone(),
            })
            .collect();
        renamed.push(Table::new(columns)?);
    }

    let mut tables = renamed.into_iter();
    let mut joined = tables.next().unwrap_or_default();
    for table in tables {
        joined = outer_join(&joined, &table, keys)?;
    }
    Ok(joined)
}

/// `base`, or `base_2`, `base_3`, ... if already taken. Records the result.
fn unique_name(base: &str, taken: &mut HashSet<String>) -> String {
    let mut name = base.to_string();
    let mut n = 2;
    while taken.contains(&name) {
        name = format!("{base}_{n}");
        n += 1;
    }
    taken.insert(name.clone());
    name
}

fn force_merge(inputs: &[NamedTable], no_overlap: bool) -> Result<Table> {
    let tables: Vec<&Table> = inputs.iter().map(|i| &i.table).collect();

    // Union in first-seen order; provenance columns are always rebuilt
    let mut union: Vec<String> = Vec::new();
    for table in &tables {
        for name in table.column_names() {
            if name != SOURCE_FILE_COLUMN
                && name != FILE_TYPE_COLUMN
                && !union.iter().any(|u| u == name)
            {
                union.push(name.to_string());
            }
        }
    }

    let mut merged = stack(&tables, &union)?;

    merged = merged.with_column(Column::new(
        SOURCE_FILE_COLUMN,
        ColumnType::Text,
        per_row(inputs, |input| input.filename.clone()),
    ))?;

    if no_overlap {
        merged = merged.with_column(Column::new(
            FILE_TYPE_COLUMN,
            ColumnType::Text,
            per_row(inputs, |input| {
                classify_source(&input.table, Some(input.filename.as_str()))
                    .display_name()
                    .to_string()
            }),
        ))?;
    }

    Ok(merged)
}

/// One label per row, repeated over each input's rows.
fn per_row(inputs: &[NamedTable], label: impl Fn(&NamedTable) -> String) -> Vec<Value> {
    inputs
        .iter()
        .flat_map(|input| std::iter::repeat_n(Value::Text(label(input)), input.table.row_count()))
        .collect()
}

/// Sanitized, unique file stems used as column suffixes.
fn file_stems(inputs: &[NamedTable]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    inputs
        .iter()
        .enumerate()
        .map(|(idx, input)| {
            let stem = sanitize_stem(&input.filename);
            let unique = if used.contains(&stem) {
                format!("{}_{}", stem, idx + 1)
            } else {
                stem
            };
            used.insert(unique.clone());
            unique
        })
        .collect()
}

fn sanitize_stem(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let cleaned: String = stem
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FinlensError;

    fn named(file: &str, headers: &[&str], rows: &[&[&str]]) -> NamedTable {
        let rows: Vec<Vec<&str>> = rows.iter().map(|r| r.to_vec()).collect();
        NamedTable::new(file, Table::from_rows(headers, &rows).unwrap())
    }

    #[test]
    fn test_no_input() {
        let err = merge(&[]).unwrap_err();
        assert!(matches!(err, FinlensError::Merge(MergeError::NoInput)));
    }

    #[test]
    fn test_single_table_unchanged() {
        let input = named("a.csv", &["service", "cost"], &[&["EC2", "1.5"]]);
        let outcome = merge(std::slice::from_ref(&input)).unwrap();
        assert_eq!(outcome.strategy, MergeStrategy::SingleTable);
        assert_eq!(outcome.table, input.table);
    }

    #[test]
    fn test_identical_schema_stacks_in_first_order() {
        let a = named("jan.csv", &["service", "cost"], &[&["EC2", "1"], &["S3", "2"]]);
        let b = named("feb.csv", &["cost", "service"], &[&["3", "RDS"]]);

        let outcome = merge(&[a, b]).unwrap();
        assert_eq!(outcome.strategy, MergeStrategy::IdenticalSchema);
        assert_eq!(outcome.table.column_names(), vec!["service", "cost"]);
        assert_eq!(outcome.table.row_count(), 3);
        assert_eq!(
            outcome.table.column("service").unwrap().get(2),
            Some(&Value::Text("RDS".into()))
        );
    }

    #[test]
    fn test_common_columns_projects() {
        let a = named("a.csv", &["service", "region", "cost"], &[&["EC2", "us-east-1", "1"]]);
        let b = named("b.csv", &["region", "service", "owner"], &[&["eu-west-1", "S3", "ops"]]);

        let outcome = merge(&[a, b]).unwrap();
        assert_eq!(outcome.strategy, MergeStrategy::CommonColumns);
        assert_eq!(outcome.common_columns, vec!["service", "region"]);
        assert_eq!(outcome.table.column_names(), vec!["service", "region"]);
        assert_eq!(outcome.table.row_count(), 2);
    }

    #[test]
    fn test_key_join_with_suffixes() {
        let a = named("EC2 Costs.csv", &["region", "cost"], &[&["us-east-1", "10"], &["eu-west-1", "4"]]);
        let b = named("s3-costs.csv", &["region", "cost"], &[&["us-east-1", "2"]]);
        // Add a distinguishing column so the schemas differ
        let b = NamedTable::new(
            b.filename.clone(),
            b.table
                .with_column(Column::new("bucket", ColumnType::Text, vec![Value::Text("logs".into())]))
                .unwrap(),
        );

        let engine = ReconciliationEngine::with_config(ReconcileConfig {
            min_common_columns: 3,
            ..ReconcileConfig::default()
        });
        let outcome = engine.merge(&[a, b]).unwrap();

        assert_eq!(outcome.strategy, MergeStrategy::KeyJoin);
        assert_eq!(outcome.join_keys, vec!["region"]);
        assert_eq!(
            outcome.table.column_names(),
            vec!["region", "cost_ec2_costs", "cost_s3_costs", "bucket"]
        );
        assert_eq!(outcome.table.row_count(), 2);
    }

    #[test]
    fn test_key_join_three_tables_avoids_existing_names() {
        let a = named("a.csv", &["region", "cost", "cost_b"], &[&["us-east-1", "1", "9"]]);
        let b = named("b.csv", &["region", "cost"], &[&["us-east-1", "2"], &["eu-west-1", "3"]]);
        let c = named("c.csv", &["region", "zone"], &[&["eu-west-1", "eu-west-1a"]]);

        let outcome = merge(&[a, b, c]).unwrap();
        assert_eq!(outcome.strategy, MergeStrategy::KeyJoin);
        assert_eq!(outcome.join_keys, vec!["region"]);
        assert_eq!(
            outcome.table.column_names(),
            vec!["region", "cost_a", "cost_b", "cost_b_2", "zone"]
        );
        assert_eq!(outcome.table.row_count(), 2);

        let us = outcome.table.row(0).unwrap();
        assert_eq!(
            us,
            vec![
                &Value::Text("us-east-1".into()),
                &Value::Integer(1),
                &Value::Integer(9),
                &Value::Integer(2),
                &Value::Null,
            ]
        );
        let eu = outcome.table.row(1).unwrap();
        assert_eq!(eu[0], &Value::Text("eu-west-1".into()));
        assert_eq!(eu[3], &Value::Integer(3));
        assert_eq!(eu[4], &Value::Text("eu-west-1a".into()));
    }

    #[test]
    fn test_unique_name() {
        let mut taken: HashSet<String> = ["cost_b".to_string(), "cost_b_2".to_string()].into();
        assert_eq!(unique_name("cost_b", &mut taken), "cost_b_3");
        assert_eq!(unique_name("cost_a", &mut taken), "cost_a");
        assert_eq!(unique_name("cost_a", &mut taken), "cost_a_2");
    }

    #[test]
    fn test_identical_schema_keeps_cost_numeric_after_empty_first_file() {
        let a = named("a.csv", &["service", "region", "total_cost"], &[&["EC2", "us", ""]]);
        let b = named("b.csv", &["service", "region", "total_cost"], &[&["S3", "eu", "12.5"]]);

        let outcome = merge(&[a, b]).unwrap();
        assert_eq!(outcome.strategy, MergeStrategy::IdenticalSchema);
        let cost = outcome.table.column("total_cost").unwrap();
        assert_eq!(cost.column_type, ColumnType::Float);
        assert_eq!(cost.values(), &[Value::Null, Value::Float(12.5)]);
        assert_eq!(
            crate::inference::classify_columns(&outcome.table).role_of("total_cost"),
            Some(crate::schema::ColumnRole::Cost)
        );
    }

    #[test]
    fn test_key_join_single_shared_key() {
        let a = named("a.csv", &["month", "spend"], &[&["2024-01", "10"]]);
        let b = named("b.csv", &["month", "credits"], &[&["2024-01", "3"], &["2024-02", "1"]]);

        let outcome = merge(&[a, b]).unwrap();
        assert_eq!(outcome.strategy, MergeStrategy::KeyJoin);
        assert_eq!(outcome.table.column_names(), vec!["month", "spend", "credits"]);
        assert_eq!(outcome.table.row_count(), 2);
    }

    #[test]
    fn test_force_merge_adds_provenance() {
        let a = named("check.csv", &["check_name", "status"], &[&["x", "ok"]]);
        let b = named("vols.csv", &["volume_id", "size"], &[&["vol-1", "8"], &["vol-2", "16"]]);

        let outcome = merge(&[a, b]).unwrap();
        assert_eq!(outcome.strategy, MergeStrategy::ForceMerge);
        assert_eq!(outcome.table.row_count(), 3);
        assert_eq!(
            outcome.table.column_names(),
            vec!["check_name", "status", "volume_id", "size", "_source_file", "_file_type"]
        );
        let types = outcome.table.column("_file_type").unwrap();
        assert_eq!(types.get(0), Some(&Value::Text("AWS Trusted Advisor Report".into())));
        assert_eq!(types.get(2), Some(&Value::Text("EBS Volume Report".into())));
    }

    #[test]
    fn test_force_merge_with_overlap_has_no_file_type() {
        let a = named("a.csv", &["owner", "x"], &[&["a", "1"]]);
        let b = named("b.csv", &["owner", "y"], &[&["b", "2"]]);

        let outcome = merge(&[a, b]).unwrap();
        assert_eq!(outcome.strategy, MergeStrategy::ForceMerge);
        assert!(outcome.table.has_column("_source_file"));
        assert!(!outcome.table.has_column("_file_type"));
    }

    #[test]
    fn test_force_merge_disabled() {
        let a = named("a.csv", &["x"], &[&["1"]]);
        let b = named("b.csv", &["y"], &[&["2"]]);

        let engine = ReconciliationEngine::with_config(ReconcileConfig {
            allow_force_merge: false,
            ..ReconcileConfig::default()
        });
        let err = engine.merge(&[a, b]).unwrap_err();
        assert!(matches!(
            err,
            FinlensError::Merge(MergeError::NoStrategy { ref files }) if files.len() == 2
        ));
    }

    #[test]
    fn test_sanitize_stem() {
        assert_eq!(sanitize_stem("EC2 Costs (Jan).csv"), "ec2_costs__jan_");
        assert_eq!(sanitize_stem(".csv"), "_csv");
        assert_eq!(sanitize_stem(""), "file");
    }
}
