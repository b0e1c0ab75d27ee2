//! Column role resolution: which physical column is the entity, the year
//! and the value.
//!
//! Each role has a candidate list in priority order. The first candidate that
//! exactly matches a column name binds (case-sensitive, no fuzzy matching).

use std::fmt;

use serde::Serialize;

use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Entity,
    Year,
    Value,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Entity => "entity",
            Role::Year => "year",
            Role::Value => "value",
        };
        f.write_str(name)
    }
}

/// Candidate column names per role, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleCandidates {
    pub entity: &'static [&'static str],
    pub year: &'static [&'static str],
    pub value: &'static [&'static str],
}

impl RoleCandidates {
    pub fn for_role(&self, role: Role) -> &'static [&'static str] {
        match role {
            Role::Entity => self.entity,
            Role::Year => self.year,
            Role::Value => self.value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoleMapping {
    pub entity: Option<String>,
    pub year: Option<String>,
    pub value: Option<String>,
}

impl RoleMapping {
    pub fn get(&self, role: Role) -> Option<&str> {
        match role {
            Role::Entity => self.entity.as_deref(),
            Role::Year => self.year.as_deref(),
            Role::Value => self.value.as_deref(),
        }
    }

    /// Required roles that did not bind, in the order given.
    pub fn missing(&self, required: &[Role]) -> Vec<Role> {
        required
            .iter()
            .copied()
            .filter(|&r| self.get(r).is_none())
            .collect()
    }
}

/// Bind every role against the table's column names.
pub fn resolve_roles(table: &Table, candidates: &RoleCandidates) -> RoleMapping {
    let bind = |role| find_column(table.columns(), candidates.for_role(role));
    RoleMapping {
        entity: bind(Role::Entity),
        year: bind(Role::Year),
        value: bind(Role::Value),
    }
}

/// First candidate (by priority) present among `columns`.
fn find_column(columns: &[String], candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .copied()
        .find(|candidate| columns.iter().any(|c| c.as_str() == *candidate))
        .map(str::to_string)
}
