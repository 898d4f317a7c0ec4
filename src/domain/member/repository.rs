//! Member repository trait

use async_trait::async_trait;

use super::entity::{Member, MemberId, NewMember};
use crate::domain::page::PageRequest;
use crate::domain::project::ProjectId;
use crate::domain::team::TeamId;
use crate::domain::DomainError;

/// Row-level access to the members table inside a transaction
#[async_trait]
pub trait MemberRepository: Send {
    async fn find_member(&mut self, id: MemberId) -> Result<Option<Member>, DomainError>;

    /// One page of members across all teams, in insertion order
    async fn list_members(&mut self, page: PageRequest) -> Result<Vec<Member>, DomainError>;

    async fn count_members(&mut self) -> Result<usize, DomainError>;

    /// Members owned by a team, in insertion order
    async fn members_of_team(&mut self, team: TeamId) -> Result<Vec<Member>, DomainError>;

    /// Members linked to a project, in link order
    async fn members_of_project(&mut self, project: ProjectId)
        -> Result<Vec<Member>, DomainError>;

    async fn insert_member(&mut self, member: NewMember) -> Result<Member, DomainError>;

    async fn update_member(&mut self, member: &Member) -> Result<(), DomainError>;

    /// Delete a member row, returns true if it existed
    async fn delete_member(&mut self, id: MemberId) -> Result<bool, DomainError>;
}
