//! DataFusion-backed execution over the managed table.

use datafusion::arrow::datatypes::Schema;
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::error::DataFusionError;
use datafusion::execution::context::SQLOptions;
use datafusion::prelude::{SessionConfig, SessionContext};
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use tokio::runtime::Runtime;

use super::convert::{batches_to_table, table_to_batch};
use super::guard::{self, quote_ident};
use super::stats::{CostStats, DimensionBreakdown, TOP_DIMENSIONS, TOP_VALUES, TableStats};
use crate::error::{FinlensError, Result};
use crate::inference::classify_columns;
use crate::schema::{ColumnRole, RoleAssignment};
use crate::table::{Table, Value};

/// Name the managed table is registered under unless configured otherwise.
pub const DEFAULT_TABLE_NAME: &str = "aws_data";

/// Sandbox configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Name queries must target. Must be a plain SQL identifier.
    pub table_name: String,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
        }
    }
}

impl SandboxConfig {
    pub fn validate(&self) -> Result<()> {
        let mut chars = self.table_name.chars();
        let valid = match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        };
        if valid {
            Ok(())
        } else {
            Err(FinlensError::Config(format!(
                "invalid table name '{}': expected letters, digits and underscores",
                self.table_name
            )))
        }
    }
}

struct Loaded {
    table: Table,
    batch: RecordBatch,
    roles: RoleAssignment,
    stats: OnceCell<TableStats>,
}

/// Runs validated, read-only SQL against a single managed table.
///
/// The engine is async; the sandbox owns a current-thread runtime and blocks on
/// it, so every method here is synchronous.
///
/// Unquoted identifiers are not lowercased, so `Service` names the column
/// exactly as it appears in the export header.
pub struct QuerySandbox {
    config: SandboxConfig,
    ctx: SessionContext,
    runtime: Runtime,
    loaded: Option<Loaded>,
}

impl QuerySandbox {
    /// Create a sandbox whose managed table is called `table_name`.
    pub fn new(table_name: impl Into<String>) -> Result<Self> {
        Self::with_config(SandboxConfig {
            table_name: table_name.into(),
        })
    }

    pub fn with_config(config: SandboxConfig) -> Result<Self> {
        config.validate()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| FinlensError::QueryExecution(format!("failed to start runtime: {e}")))?;

        Ok(Self {
            config,
            ctx: engine_context(),
            runtime,
            loaded: None,
        })
    }

    pub fn table_name(&self) -> &str {
        &self.config.table_name
    }

    /// The managed table, if one is loaded.
    pub fn table(&self) -> Option<&Table> {
        self.loaded.as_ref().map(|l| &l.table)
    }

    /// Roles of the managed table's columns.
    pub fn roles(&self) -> Option<&RoleAssignment> {
        self.loaded.as_ref().map(|l| &l.roles)
    }

    /// Replace the managed table.
    ///
    /// The new table is converted before anything is swapped; if registration
    /// fails the previous table is restored.
    pub fn load(&mut self, table: Table) -> Result<()> {
        let batch = table_to_batch(&table)?;
        let name = self.config.table_name.clone();

        self.ctx.deregister_table(name.as_str()).map_err(engine_error)?;
        if let Err(e) = self.ctx.register_batch(name.as_str(), batch.clone()) {
            if let Some(previous) = &self.loaded {
                if let Err(restore) = self.ctx.register_batch(name.as_str(), previous.batch.clone())
                {
                    log::warn!("failed to restore previous table '{}': {}", name, restore);
                }
            }
            return Err(engine_error(e));
        }

        log::info!(
            "loaded {} rows x {} columns as '{}'",
            table.row_count(),
            table.column_count(),
            name
        );

        let roles = classify_columns(&table);
        self.loaded = Some(Loaded {
            table,
            batch,
            roles,
            stats: OnceCell::new(),
        });
        Ok(())
    }

    /// Validate, rewrite and run a user query. The result is a new table.
    pub fn execute(&self, query: &str) -> Result<Table> {
        let sql = guard::prepare(query, &self.config.table_name)?;
        self.run_sql(&sql)
    }

    /// Run generated SQL. Skips the denylist (column names such as
    /// `update_date` would trip it) but keeps the engine-level restrictions.
    pub(crate) fn run_sql(&self, sql: &str) -> Result<Table> {
        let options = SQLOptions::new()
            .with_allow_ddl(false)
            .with_allow_dml(false)
            .with_allow_statements(false);

        let (schema, batches) = self
            .runtime
            .block_on(async {
                let df = self.ctx.sql_with_options(sql, options).await?;
                let schema: Schema = df.schema().as_arrow().clone();
                let batches = df.collect().await?;
                Ok::<_, DataFusionError>((schema, batches))
            })
            .map_err(engine_error)?;

        batches_to_table(&schema, &batches)
    }

    /// Headline statistics, computed once per load.
    pub fn stats(&self) -> Result<TableStats> {
        let loaded = self.loaded.as_ref().ok_or_else(no_table)?;
        loaded
            .stats
            .get_or_try_init(|| self.compute_stats(&loaded.roles))
            .cloned()
    }

    fn compute_stats(&self, roles: &RoleAssignment) -> Result<TableStats> {
        let table = &self.config.table_name;

        let count = self.run_sql(&format!("SELECT COUNT(*) AS total_rows FROM {table}"))?;
        let total_rows = cell(&count, 0, 0)
            .and_then(Value::as_f64)
            .map(|n| n as usize)
            .unwrap_or(0);

        let cost = match roles.first(ColumnRole::Cost) {
            Some(column) => {
                let c = quote_ident(column);
                let result = self.run_sql(&format!(
                    "SELECT SUM({c}), AVG({c}), MAX({c}), MIN({c}) FROM {table}"
                ))?;
                let agg = |idx| cell(&result, 0, idx).and_then(Value::as_f64).unwrap_or(0.0);
                Some(CostStats {
                    column: column.to_string(),
                    total: agg(0),
                    average: agg(1),
                    max: agg(2),
                    min: agg(3),
                })
            }
            None => None,
        };

        let mut top_dimensions = Vec::new();
        for column in roles
            .columns_with(ColumnRole::Dimension)
            .into_iter()
            .take(TOP_DIMENSIONS)
        {
            let d = quote_ident(column);
            let result = self.run_sql(&format!(
                "SELECT {d}, COUNT(*) AS \"count\" FROM {table} GROUP BY {d} \
                 ORDER BY \"count\" DESC, {d} ASC NULLS LAST LIMIT {TOP_VALUES}"
            ))?;
            let values: Vec<(Value, usize)> = (0..result.row_count())
                .map(|row| {
                    let value = cell(&result, row, 0).cloned().unwrap_or(Value::Null);
                    let count = cell(&result, row, 1)
                        .and_then(Value::as_f64)
                        .map(|n| n as usize)
                        .unwrap_or(0);
                    (value, count)
                })
                .collect();
            top_dimensions.push(DimensionBreakdown {
                column: column.to_string(),
                values,
            });
        }

        Ok(TableStats {
            total_rows,
            cost,
            top_dimensions,
        })
    }
}

fn engine_context() -> SessionContext {
    let mut config = SessionConfig::new();
    config.options_mut().sql_parser.enable_ident_normalization = false;
    SessionContext::new_with_config(config)
}

fn cell(table: &Table, row: usize, column: usize) -> Option<&Value> {
    table.columns().get(column).and_then(|c| c.get(row))
}

fn engine_error(e: DataFusionError) -> FinlensError {
    FinlensError::QueryExecution(e.to_string())
}

pub(crate) fn no_table() -> FinlensError {
    FinlensError::EmptyData("no table loaded".to_string())
}
