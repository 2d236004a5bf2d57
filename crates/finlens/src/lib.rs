//! finlens: schema-free analysis of cloud cost and usage exports.
//!
//! finlens takes tabular exports of unknown origin and, without a
//! user-supplied schema, works out what kind of data each one is, what role
//! each column plays, how several files fit together, and then answers
//! queries against the combined table inside a read-only sandbox.
//!
//! # Core Principles
//!
//! - **Schema-free**: types, roles and source labels are inferred from the data
//! - **Non-destructive**: inputs are never modified; every step yields a new table
//! - **Read-only querying**: user SQL cannot change or drop data
//!
//! # Example
//!
//! ```no_run
//! use finlens::Session;
//!
//! let mut session = Session::new().unwrap();
//! let outcome = session.load_files(&["jan.csv", "feb.csv"]).unwrap();
//! println!("Merged with {} strategy", outcome.strategy);
//!
//! let analysis = session.analyze().unwrap();
//! println!("Looks like: {}", analysis.source);
//!
//! let top = session
//!     .query("SELECT service, SUM(total_cost) FROM aws_data GROUP BY service")
//!     .unwrap();
//! println!("{} rows", top.row_count());
//! ```

pub mod error;
pub mod inference;
pub mod input;
pub mod reconcile;
pub mod sandbox;
pub mod schema;
pub mod session;
pub mod table;

pub use error::{FinlensError, MergeError, Result};
pub use inference::{classify_columns, classify_source, infer_file_type, infer_service, profile};
pub use input::{NamedTable, Parser, ParserConfig, SourceMetadata};
pub use reconcile::{MergeOutcome, MergeStrategy, ReconcileConfig, ReconciliationEngine, merge};
pub use sandbox::{QuerySandbox, SandboxConfig, TableStats};
pub use schema::{ColumnProfile, ColumnRole, DatasetProfile, RoleAssignment, ServiceLabel, SourceLabel};
pub use session::{
    AggregationKind, AggregationRequest, Analysis, Analyst, Backend, Session, SessionConfig,
};
pub use table::{Column, ColumnType, Table, Value};
