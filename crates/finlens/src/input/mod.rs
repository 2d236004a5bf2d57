//! Ingestion of delimited text exports.

mod parser;
mod source;

pub use parser::{Parser, ParserConfig};
pub use source::{NamedTable, SourceMetadata};
