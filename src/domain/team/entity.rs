//! Team entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::validate_team_name;
use crate::domain::id::row_id;
use crate::domain::validation::ValidationErrors;

row_id!(
    /// Team identifier
    TeamId,
    "Team"
);

/// Team entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    /// Unique identifier
    id: TeamId,
    /// Display name, unique across teams
    name: String,
    /// Creation timestamp
    created_at: DateTime<Utc>,
    /// Last update timestamp
    updated_at: DateTime<Utc>,
}

impl Team {
    /// Materialize a stored team row
    pub fn restore(
        id: TeamId,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            created_at,
            updated_at,
        }
    }

    /// Build the row for a freshly inserted team
    pub fn from_new(id: TeamId, new: NewTeam) -> Self {
        let now = Utc::now();
        Self::restore(id, new.name, now, now)
    }

    // Getters

    pub fn id(&self) -> TeamId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Mutators

    /// Apply the supplied fields; absent fields keep their value
    pub fn apply(&mut self, changes: TeamChanges) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        self.touch();
    }

    /// Presence rules for a persisted team
    pub fn validate(&self) -> ValidationErrors {
        validate_team_name(Some(&self.name))
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// A team that has not been written yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTeam {
    pub name: String,
}

impl NewTeam {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Presence rules, run before any write
    pub fn validate(&self) -> ValidationErrors {
        validate_team_name(Some(&self.name))
    }
}

/// Partial team update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamChanges {
    pub name: Option<String>,
}
