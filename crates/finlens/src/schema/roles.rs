//! Column role assignments.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::types::ColumnRole;

/// One role per column, in table column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleAssignment {
    roles: IndexMap<String, ColumnRole>,
}

impl RoleAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, column: impl Into<String>, role: ColumnRole) {
        self.roles.insert(column.into(), role);
    }

    /// Role of a column, if the column was classified.
    pub fn role_of(&self, column: &str) -> Option<ColumnRole> {
        self.roles.get(column).copied()
    }

    /// Columns with the given role, in column order.
    pub fn columns_with(&self, role: ColumnRole) -> Vec<&str> {
        self.roles
            .iter()
            .filter(|(_, r)| **r == role)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// First column with the given role.
    pub fn first(&self, role: ColumnRole) -> Option<&str> {
        self.roles
            .iter()
            .find(|(_, r)| **r == role)
            .map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ColumnRole)> {
        self.roles.iter().map(|(name, role)| (name.as_str(), *role))
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}
