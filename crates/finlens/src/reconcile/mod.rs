//! Combining several exports into one analyzable table.
//!
//! Strategies are tried in a fixed order (identical schema, common columns,
//! key join, force merge); the first that applies produces the result.

mod engine;
mod join;
mod stack;

pub use engine::{
    JOIN_KEY_CANDIDATES, MergeOutcome, MergeStrategy, ReconcileConfig, ReconciliationEngine, merge,
};
