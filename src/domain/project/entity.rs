//! Project entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::validate_project_name;
use crate::domain::id::row_id;
use crate::domain::member::MemberId;
use crate::domain::validation::ValidationErrors;

row_id!(
    /// Project identifier
    ProjectId,
    "Project"
);

/// Project entity; members attach through membership rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    id: ProjectId,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Project {
    /// Materialize a stored project row
    pub fn restore(
        id: ProjectId,
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

    /// Build the row for a freshly inserted project
    pub fn from_new(id: ProjectId, new: &NewProject) -> Self {
        let now = Utc::now();
        Self::restore(id, new.name.clone(), now, now)
    }

    pub fn id(&self) -> ProjectId {
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

    /// Apply the row fields; the member set is handled by the caller
    pub fn apply(&mut self, changes: &ProjectChanges) {
        if let Some(name) = &changes.name {
            self.name = name.clone();
        }
        self.updated_at = Utc::now();
    }

    pub fn validate(&self) -> ValidationErrors {
        validate_project_name(Some(&self.name))
    }
}

/// A project that has not been written yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    /// Members to link right after insert
    pub member_ids: Vec<MemberId>,
}

impl NewProject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            member_ids: Vec::new(),
        }
    }

    pub fn with_members(mut self, member_ids: Vec<MemberId>) -> Self {
        self.member_ids = member_ids;
        self
    }

    pub fn validate(&self) -> ValidationErrors {
        validate_project_name(Some(&self.name))
    }
}

/// Partial project update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectChanges {
    pub name: Option<String>,
    /// When present, replaces the whole member set
    pub member_ids: Option<Vec<MemberId>>,
}
