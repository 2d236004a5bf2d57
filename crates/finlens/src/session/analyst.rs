//! The analysis interface and its two backends.

use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};

use super::aggregate::{AggregationRequest, AggregationSuggestion, suggest};
use super::config::Backend;
use crate::error::{FinlensError, Result};
use crate::inference::{Profiler, classify_columns, classify_source, infer_service};
use crate::sandbox::{QuerySandbox, SandboxConfig, TableStats, guard, no_table};
use crate::schema::{DatasetProfile, RoleAssignment, ServiceLabel, SourceLabel};
use crate::table::Table;

/// Everything inferred about the managed table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub service: ServiceLabel,
    pub source: SourceLabel,
    pub profile: DatasetProfile,
    pub roles: RoleAssignment,
}

impl Analysis {
    /// Analyze a table. `sample_rows` limits profiling to the first rows;
    /// labels and roles depend only on column names and types.
    pub fn of(table: &Table, filename: Option<&str>, sample_rows: Option<usize>) -> Self {
        Self {
            service: infer_service(&table.column_names()),
            source: classify_source(table, filename),
            profile: Profiler::with_sample_rows(sample_rows).profile(table),
            roles: classify_columns(table),
        }
    }
}

/// Operations a session offers over its managed table.
pub trait Analyst {
    fn backend(&self) -> Backend;

    /// Replace the managed table. On error the previous table stays active.
    fn load(&mut self, table: Table) -> Result<()>;

    fn table(&self) -> Option<&Table>;

    fn roles(&self) -> Option<&RoleAssignment>;

    fn analyze(&self, filename: Option<&str>) -> Result<Analysis>;

    /// Run a free-form query.
    fn query(&self, sql: &str) -> Result<Table>;

    fn aggregate(&self, request: &AggregationRequest) -> Result<Table>;

    fn stats(&self) -> Result<TableStats>;

    fn suggestions(&self) -> Vec<AggregationSuggestion> {
        self.roles().map(suggest).unwrap_or_default()
    }
}

struct Managed {
    table: Table,
    roles: RoleAssignment,
    stats: OnceCell<TableStats>,
}

/// In-memory analyst. Answers everything except free-form SQL.
#[derive(Default)]
pub struct BasicAnalyst {
    managed: Option<Managed>,
    sample_rows: Option<usize>,
}

impl BasicAnalyst {
    pub fn new(sample_rows: Option<usize>) -> Self {
        Self {
            managed: None,
            sample_rows,
        }
    }

    fn managed(&self) -> Result<&Managed> {
        self.managed.as_ref().ok_or_else(no_table)
    }
}

impl Analyst for BasicAnalyst {
    fn backend(&self) -> Backend {
        Backend::Basic
    }

    fn load(&mut self, table: Table) -> Result<()> {
        let roles = classify_columns(&table);
        log::info!(
            "loaded {} rows x {} columns in memory",
            table.row_count(),
            table.column_count()
        );
        self.managed = Some(Managed {
            table,
            roles,
            stats: OnceCell::new(),
        });
        Ok(())
    }

    fn table(&self) -> Option<&Table> {
        self.managed.as_ref().map(|m| &m.table)
    }

    fn roles(&self) -> Option<&RoleAssignment> {
        self.managed.as_ref().map(|m| &m.roles)
    }

    fn analyze(&self, filename: Option<&str>) -> Result<Analysis> {
        Ok(Analysis::of(&self.managed()?.table, filename, self.sample_rows))
    }

    fn query(&self, sql: &str) -> Result<Table> {
        guard::check(sql)?;
        Err(FinlensError::QueryExecution(
            "free-form SQL needs the sql backend".to_string(),
        ))
    }

    fn aggregate(&self, request: &AggregationRequest) -> Result<Table> {
        request.evaluate(&self.managed()?.table)
    }

    fn stats(&self) -> Result<TableStats> {
        let managed = self.managed()?;
        Ok(managed
            .stats
            .get_or_init(|| TableStats::compute(&managed.table, &managed.roles))
            .clone())
    }
}

/// DataFusion-backed analyst.
pub struct SqlAnalyst {
    sandbox: QuerySandbox,
    sample_rows: Option<usize>,
}

impl SqlAnalyst {
    pub fn new(config: SandboxConfig, sample_rows: Option<usize>) -> Result<Self> {
        Ok(Self {
            sandbox: QuerySandbox::with_config(config)?,
            sample_rows,
        })
    }

    pub fn sandbox(&self) -> &QuerySandbox {
        &self.sandbox
    }
}

impl Analyst for SqlAnalyst {
    fn backend(&self) -> Backend {
        Backend::Sql
    }

    fn load(&mut self, table: Table) -> Result<()> {
        self.sandbox.load(table)
    }

    fn table(&self) -> Option<&Table> {
        self.sandbox.table()
    }

    fn roles(&self) -> Option<&RoleAssignment> {
        self.sandbox.roles()
    }

    fn analyze(&self, filename: Option<&str>) -> Result<Analysis> {
        let table = self.sandbox.table().ok_or_else(no_table)?;
        Ok(Analysis::of(table, filename, self.sample_rows))
    }

    fn query(&self, sql: &str) -> Result<Table> {
        self.sandbox.execute(sql)
    }

    fn aggregate(&self, request: &AggregationRequest) -> Result<Table> {
        let table = self.sandbox.table().ok_or_else(no_table)?;
        request.validate(table)?;
        self.sandbox.run_sql(&request.to_sql(self.sandbox.table_name()))
    }

    fn stats(&self) -> Result<TableStats> {
        self.sandbox.stats()
    }
}
