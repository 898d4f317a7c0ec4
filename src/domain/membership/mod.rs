//! Project membership: the join row between members and projects
//!
//! Either side may be unset. Deleting a project clears `project_id` on its
//! rows; deleting a member removes its rows outright.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::id::row_id;
use crate::domain::member::MemberId;
use crate::domain::project::ProjectId;
use crate::domain::DomainError;

row_id!(
    /// Membership row identifier
    MembershipId,
    "Membership"
);

/// Join row linking a member to a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMember {
    id: MembershipId,
    project_id: Option<ProjectId>,
    member_id: Option<MemberId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProjectMember {
    pub fn restore(
        id: MembershipId,
        project_id: Option<ProjectId>,
        member_id: Option<MemberId>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            project_id,
            member_id,
            created_at,
            updated_at,
        }
    }

    /// Build a fresh link between a project and a member
    pub fn link(id: MembershipId, project_id: ProjectId, member_id: MemberId) -> Self {
        let now = Utc::now();
        Self::restore(id, Some(project_id), Some(member_id), now, now)
    }

    pub fn id(&self) -> MembershipId {
        self.id
    }

    pub fn project_id(&self) -> Option<ProjectId> {
        self.project_id
    }

    pub fn member_id(&self) -> Option<MemberId> {
        self.member_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Drop the project side of the link
    pub fn clear_project(&mut self) {
        self.project_id = None;
        self.updated_at = Utc::now();
    }
}

/// Row-level access to the project_members table inside a transaction
#[async_trait]
pub trait MembershipRepository: Send {
    /// All rows pointing at a project, in insertion order
    async fn memberships_of_project(
        &mut self,
        project: ProjectId,
    ) -> Result<Vec<ProjectMember>, DomainError>;

    /// All rows pointing at a member, in insertion order
    async fn memberships_of_member(
        &mut self,
        member: MemberId,
    ) -> Result<Vec<ProjectMember>, DomainError>;

    /// Every row, including orphaned ones
    async fn all_memberships(&mut self) -> Result<Vec<ProjectMember>, DomainError>;

    async fn insert_membership(
        &mut self,
        project: ProjectId,
        member: MemberId,
    ) -> Result<ProjectMember, DomainError>;

    async fn update_membership(&mut self, membership: &ProjectMember) -> Result<(), DomainError>;

    async fn delete_membership(&mut self, id: MembershipId) -> Result<bool, DomainError>;
}
