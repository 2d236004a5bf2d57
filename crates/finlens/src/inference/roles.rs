//! Column role classification.
//!
//! Roles come from an ordered rule table. Each column is checked against the
//! rules top-down and takes the role of the first rule it satisfies; columns
//! that satisfy none are dimensions. Rule order matters: `account_cost` is an
//! identifier because the identifier rule is checked before the cost rule.

use crate::schema::{ColumnRole, RoleAssignment};
use crate::table::{ColumnType, Table};

/// Condition a column must satisfy for a rule to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolePredicate {
    /// Lowercased name contains any of the fragments.
    NameContains(&'static [&'static str]),
    /// Numeric type and lowercased name contains any of the fragments.
    NumericNameContains(&'static [&'static str]),
    /// Numeric type.
    Numeric,
}

impl RolePredicate {
    fn matches(&self, lower_name: &str, column_type: ColumnType) -> bool {
        match self {
            RolePredicate::NameContains(fragments) => {
                fragments.iter().any(|f| lower_name.contains(f))
            }
            RolePredicate::NumericNameContains(fragments) => {
                column_type.is_numeric() && fragments.iter().any(|f| lower_name.contains(f))
            }
            RolePredicate::Numeric => column_type.is_numeric(),
        }
    }
}

/// A predicate and the role it assigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleRule {
    pub predicate: RolePredicate,
    pub role: ColumnRole,
}

/// Role rules in priority order. Unmatched columns are [`ColumnRole::Dimension`].
pub const ROLE_RULES: &[RoleRule] = &[
    RoleRule {
        predicate: RolePredicate::NameContains(&["id", "arn", "resource_id", "account"]),
        role: ColumnRole::Identifier,
    },
    RoleRule {
        predicate: RolePredicate::NumericNameContains(&["cost", "charge", "price"]),
        role: ColumnRole::Cost,
    },
    RoleRule {
        predicate: RolePredicate::Numeric,
        role: ColumnRole::Metric,
    },
    RoleRule {
        predicate: RolePredicate::NameContains(&[
            "date",
            "time",
            "timestamp",
            "created",
            "modified",
        ]),
        role: ColumnRole::Timestamp,
    },
    RoleRule {
        predicate: RolePredicate::NameContains(&["tag"]),
        role: ColumnRole::Tag,
    },
];

/// Assigns a [`ColumnRole`] to every column of a table.
#[derive(Debug, Clone, Copy)]
pub struct RoleClassifier {
    rules: &'static [RoleRule],
}

impl RoleClassifier {
    pub fn new() -> Self {
        Self { rules: ROLE_RULES }
    }

    /// Classify a single column by name and type.
    pub fn classify(&self, name: &str, column_type: ColumnType) -> ColumnRole {
        let lower = name.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.predicate.matches(&lower, column_type))
            .map(|rule| rule.role)
            .unwrap_or(ColumnRole::Dimension)
    }

    /// Classify every column of a table.
    pub fn classify_table(&self, table: &Table) -> RoleAssignment {
        let mut assignment = RoleAssignment::new();
        for column in table.columns() {
            assignment.insert(column.name.clone(), self.classify(&column.name, column.column_type));
        }
        assignment
    }
}

impl Default for RoleClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify every column of a table with the default rules.
pub fn classify_columns(table: &Table) -> RoleAssignment {
    RoleClassifier::new().classify_table(table)
}
