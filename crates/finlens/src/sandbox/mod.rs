//! Safe ad-hoc querying of the managed table.
//!
//! Queries pass two guards: a keyword denylist applied to the raw text, then
//! the engine's own refusal to plan DDL, DML or session statements.

mod convert;
mod executor;
pub mod guard;
mod stats;

pub use executor::{DEFAULT_TABLE_NAME, QuerySandbox, SandboxConfig};
pub(crate) use executor::no_table;
pub use stats::{CostStats, DimensionBreakdown, TOP_DIMENSIONS, TOP_VALUES, TableStats};
