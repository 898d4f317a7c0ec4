//! Member entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::validate_member_names;
use crate::domain::id::row_id;
use crate::domain::team::TeamId;
use crate::domain::validation::ValidationErrors;

row_id!(
    /// Member identifier
    MemberId,
    "Member"
);

/// Optional location fields of a member
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

/// Member entity, always owned by exactly one team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    id: MemberId,
    first_name: String,
    last_name: String,
    location: Location,
    team_id: TeamId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Member {
    /// Materialize a stored member row
    pub fn restore(
        id: MemberId,
        new: NewMember,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            first_name: new.first_name,
            last_name: new.last_name,
            location: new.location,
            team_id: new.team_id,
            created_at,
            updated_at,
        }
    }

    /// Build the row for a freshly inserted member
    pub fn from_new(id: MemberId, new: NewMember) -> Self {
        let now = Utc::now();
        Self::restore(id, new, now, now)
    }

    pub fn id(&self) -> MemberId {
        self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn city(&self) -> Option<&str> {
        self.location.city.as_deref()
    }

    pub fn state(&self) -> Option<&str> {
        self.location.state.as_deref()
    }

    pub fn country(&self) -> Option<&str> {
        self.location.country.as_deref()
    }

    pub fn team_id(&self) -> TeamId {
        self.team_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Apply the supplied fields; absent fields keep their value
    pub fn apply(&mut self, changes: MemberChanges) {
        if let Some(first_name) = changes.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            self.last_name = last_name;
        }
        if let Some(city) = changes.city {
            self.location.city = Some(city);
        }
        if let Some(state) = changes.state {
            self.location.state = Some(state);
        }
        if let Some(country) = changes.country {
            self.location.country = Some(country);
        }
        if let Some(team_id) = changes.team_id {
            self.team_id = team_id;
        }
        self.updated_at = Utc::now();
    }

    /// Presence rules for a persisted member
    pub fn validate(&self) -> ValidationErrors {
        validate_member_names(Some(&self.first_name), Some(&self.last_name))
    }
}

/// A member that has not been written yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    pub first_name: String,
    pub last_name: String,
    pub location: Location,
    pub team_id: TeamId,
}

impl NewMember {
    pub fn new(
        team_id: TeamId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            location: Location::default(),
            team_id,
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// Presence rules, run before any write
    pub fn validate(&self) -> ValidationErrors {
        validate_member_names(Some(&self.first_name), Some(&self.last_name))
    }
}

/// Partial member update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub team_id: Option<TeamId>,
}
