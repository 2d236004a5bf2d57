//! Types describing what was inferred about a table.

mod profile;
mod roles;
mod types;

pub use profile::{ColumnProfile, DatasetProfile};
pub use roles::RoleAssignment;
pub use types::{ColumnRole, ServiceLabel, SourceLabel};
