//! Session-scoped analysis over one managed table.
//!
//! A [`Session`] owns its configuration, an ingestion parser, the
//! reconciliation engine and one [`Analyst`] backend. Nothing is shared
//! between sessions.

mod aggregate;
mod analyst;
mod config;
mod summary;

pub use aggregate::{
    AggregationKind, AggregationRequest, AggregationSuggestion, MAX_SUGGESTIONS, TOP_GROUPS,
    suggest,
};
pub use analyst::{Analysis, Analyst, BasicAnalyst, SqlAnalyst};
pub use config::{Backend, SessionConfig};
pub use summary::{SummaryEntry, SummaryValue, summarize};

use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::input::{NamedTable, Parser, SourceMetadata};
use crate::reconcile::{MergeOutcome, ReconciliationEngine};
use crate::sandbox::{TableStats, no_table};
use crate::table::Table;

/// Loads exports, reconciles them and answers questions about the result.
pub struct Session {
    config: SessionConfig,
    parser: Parser,
    engine: ReconciliationEngine,
    analyst: Box<dyn Analyst>,
    /// File name of the loaded table when it came from a single input.
    filename: Option<String>,
    sources: Vec<SourceMetadata>,
}

impl Session {
    /// Create a session with default configuration (DataFusion backend).
    pub fn new() -> Result<Self> {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let analyst: Box<dyn Analyst> = match config.backend {
            Backend::Basic => Box::new(BasicAnalyst::new(config.sample_rows)),
            Backend::Sql => Box::new(SqlAnalyst::new(config.sandbox.clone(), config.sample_rows)?),
        };

        Ok(Self {
            parser: Parser::with_config(config.parser.clone()),
            engine: ReconciliationEngine::with_config(config.reconcile.clone()),
            analyst,
            filename: None,
            sources: Vec::new(),
            config,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn backend(&self) -> Backend {
        self.analyst.backend()
    }

    /// Parse, reconcile and load one or more files.
    pub fn load_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<MergeOutcome> {
        let mut inputs = Vec::with_capacity(paths.len());
        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let (table, metadata) = self.parser.parse_file(path)?;
            inputs.push(NamedTable::new(metadata.file.clone(), table));
            sources.push(metadata);
        }

        let outcome = self.load_tables(&inputs)?;
        self.sources = sources;
        Ok(outcome)
    }

    /// Reconcile and load already-parsed tables.
    ///
    /// If merging or loading fails the previously loaded table stays active.
    pub fn load_tables(&mut self, inputs: &[NamedTable]) -> Result<MergeOutcome> {
        let outcome = self.engine.merge(inputs)?;
        self.analyst.load(outcome.table.clone())?;

        self.filename = match inputs {
            [single] => Some(single.filename.clone()),
            _ => None,
        };
        self.sources.clear();
        Ok(outcome)
    }

    /// Load a single table directly.
    pub fn load_table(&mut self, table: Table, filename: Option<&str>) -> Result<()> {
        self.analyst.load(table)?;
        self.filename = filename.map(String::from);
        self.sources.clear();
        Ok(())
    }

    /// Parse and load in-memory export bytes.
    pub fn load_bytes(&mut self, bytes: &[u8], filename: &str) -> Result<()> {
        let (table, metadata) = self.parser.parse_bytes(bytes, filename)?;
        self.load_table(table, Some(filename))?;
        self.sources = vec![metadata];
        Ok(())
    }

    /// The managed table.
    pub fn table(&self) -> Option<&Table> {
        self.analyst.table()
    }

    /// Metadata of the files behind the managed table, when loaded from files or bytes.
    pub fn sources(&self) -> &[SourceMetadata] {
        &self.sources
    }

    pub fn analyze(&self) -> Result<Analysis> {
        self.analyst.analyze(self.filename.as_deref())
    }

    pub fn query(&self, sql: &str) -> Result<Table> {
        self.analyst.query(sql)
    }

    pub fn aggregate(&self, request: &AggregationRequest) -> Result<Table> {
        self.analyst.aggregate(request)
    }

    pub fn stats(&self) -> Result<TableStats> {
        self.analyst.stats()
    }

    pub fn suggestions(&self) -> Vec<AggregationSuggestion> {
        self.analyst.suggestions()
    }

    pub fn summary(&self) -> Result<Vec<SummaryEntry>> {
        let table = self.analyst.table().ok_or_else(no_table)?;
        let roles = self.analyst.roles().ok_or_else(no_table)?;
        Ok(summarize(table, roles))
    }

    /// Write the managed table as CSV.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<()> {
        self.analyst.table().ok_or_else(no_table)?.write_csv(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FinlensError, MergeError};
    use crate::reconcile::MergeStrategy;

    fn named(file: &str, headers: &[&str], rows: &[&[&str]]) -> NamedTable {
        let rows: Vec<Vec<&str>> = rows.iter().map(|r| r.to_vec()).collect();
        NamedTable::new(file, Table::from_rows(headers, &rows).unwrap())
    }

    #[test]
    fn test_load_and_query() {
        let mut session = Session::new().unwrap();
        let outcome = session
            .load_tables(&[
                named("jan.csv", &["service", "cost"], &[&["EC2", "10"]]),
                named("feb.csv", &["service", "cost"], &[&["S3", "5"], &["EC2", "1"]]),
            ])
            .unwrap();
        assert_eq!(outcome.strategy, MergeStrategy::IdenticalSchema);

        let result = session.query("SELECT COUNT(*) AS n FROM whatever").unwrap();
        assert_eq!(result.column("n").unwrap().get(0), Some(&crate::table::Value::Integer(3)));
    }

    #[test]
    fn test_failed_load_keeps_previous_table() {
        let mut session = Session::with_config(SessionConfig {
            reconcile: crate::reconcile::ReconcileConfig {
                allow_force_merge: false,
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap();
        session
            .load_tables(&[named("a.csv", &["service"], &[&["EC2"]])])
            .unwrap();

        let err = session
            .load_tables(&[
                named("x.csv", &["x"], &[&["1"]]),
                named("y.csv", &["y"], &[&["2"]]),
            ])
            .unwrap_err();
        assert!(matches!(err, FinlensError::Merge(MergeError::NoStrategy { .. })));
        assert_eq!(session.table().unwrap().column_names(), vec!["service"]);
    }

    #[test]
    fn test_load_bytes_and_analyze() {
        let mut session = Session::with_config(SessionConfig {
            backend: Backend::Basic,
            ..Default::default()
        })
        .unwrap();
        session
            .load_bytes(b"check_name,status\nMFA on root,ok\n", "advisor.csv")
            .unwrap();

        let analysis = session.analyze().unwrap();
        assert_eq!(analysis.source, crate::schema::SourceLabel::TrustedAdvisor);
        assert_eq!(session.sources().len(), 1);
        assert_eq!(session.backend(), Backend::Basic);
    }

    #[test]
    fn test_export_csv() {
        let mut session = Session::new().unwrap();
        session
            .load_tables(&[named("a.csv", &["service", "cost"], &[&["EC2", "1.5"]])])
            .unwrap();
        let mut out = Vec::new();
        session.export_csv(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "service,cost\nEC2,1.5\n");
    }

    #[test]
    fn test_nothing_loaded() {
        let session = Session::new().unwrap();
        assert!(session.table().is_none());
        assert!(session.summary().is_err());
        assert!(session.export_csv(Vec::new()).is_err());
    }
}
