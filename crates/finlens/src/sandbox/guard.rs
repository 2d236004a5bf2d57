//! Text-level query validation and table-name rewriting.

use crate::error::{FinlensError, Result};

/// Keywords that reject a query outright, checked in this order.
///
/// Matching is a plain substring test on the uppercased query, so an
/// identifier such as `update_date` is rejected too.
pub const DENYLIST: &[&str] = &[
    "DROP", "DELETE", "TRUNCATE", "ALTER", "CREATE", "INSERT", "UPDATE",
];

/// Reject queries containing a denylisted keyword.
pub fn check(query: &str) -> Result<()> {
    let upper = query.to_uppercase();
    match DENYLIST.iter().find(|kw| upper.contains(*kw)) {
        Some(keyword) => {
            log::warn!("rejected query containing '{}'", keyword);
            Err(FinlensError::UnsafeQuery {
                keyword: keyword.to_string(),
            })
        }
        None => Ok(()),
    }
}

/// Point the query at `table` when it does not mention it.
///
/// Identifiers are case-sensitive, so only an exact mention counts. The first
/// `FROM ` (any case) becomes `FROM <table> `, so whatever name the query used
/// is left behind as an alias. Queries without `FROM ` are returned unchanged.
pub fn rewrite(query: &str, table: &str) -> String {
    if query.contains(table) {
        return query.to_string();
    }
    match query.to_ascii_lowercase().find("from ") {
        Some(idx) => {
            let rewritten = format!("{}FROM {} {}", &query[..idx], table, &query[idx + 5..]);
            log::debug!("rewrote query to target '{}': {}", table, rewritten);
            rewritten
        }
        None => query.to_string(),
    }
}

/// Validate and rewrite a user query.
pub fn prepare(query: &str, table: &str) -> Result<String> {
    check(query)?;
    Ok(rewrite(query, table))
}

/// Quote an identifier for generated SQL.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
