//! Member service: validate-then-write operations on members

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::lifecycle::destroy_member;
use crate::domain::validation::MUST_EXIST;
use crate::domain::{
    DomainError, Member, MemberChanges, MemberId, MemberRepository, NewMember, Page, PageRequest,
    Store, Team, TeamId, TeamRepository, Transaction,
};

/// A member together with the teams it may move to
#[derive(Debug, Clone, PartialEq)]
pub struct TeamChoice {
    pub member: Member,
    pub teams: Vec<Team>,
}

/// Member service for managing members
#[derive(Debug, Clone)]
pub struct MemberService {
    store: Arc<dyn Store>,
}

impl MemberService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// One page of members across every team
    pub async fn list(&self, page: PageRequest) -> Result<Page<Member>, DomainError> {
        let mut tx = self.store.begin().await?;

        let total = tx.count_members().await?;
        let members = tx.list_members(page).await?;
        debug!(page = page.page(), total, "Listed members");

        Ok(Page::new(members, page, total))
    }

    pub async fn get(&self, id: MemberId) -> Result<Member, DomainError> {
        let mut tx = self.store.begin().await?;
        find(&mut *tx, id).await
    }

    /// Get a member through its team; a member of another team is not found
    pub async fn get_in_team(&self, team: TeamId, id: MemberId) -> Result<Member, DomainError> {
        let member = self.get(id).await?;

        if member.team_id() != team {
            return Err(missing(id));
        }

        Ok(member)
    }

    /// The member plus every team, for moving it
    pub async fn team_choice(&self, id: MemberId) -> Result<TeamChoice, DomainError> {
        let mut tx = self.store.begin().await?;

        let member = find(&mut *tx, id).await?;
        let teams = tx.all_teams().await?;

        Ok(TeamChoice { member, teams })
    }

    /// Create a member in an existing team
    pub async fn create(&self, member: NewMember) -> Result<Member, DomainError> {
        let mut tx = self.store.begin().await?;

        if tx.find_team(member.team_id).await?.is_none() {
            return Err(DomainError::not_found(format!(
                "Team '{}' not found",
                member.team_id
            )));
        }

        member.validate().into_result().map_err(DomainError::validation)?;

        let member = tx.insert_member(member).await?;
        tx.commit().await?;

        info!(
            id = %member.id(),
            team_id = %member.team_id(),
            name = %member.full_name(),
            "Created member"
        );
        Ok(member)
    }

    /// Apply the supplied fields; a new `team_id` must name an existing team
    pub async fn update(&self, id: MemberId, changes: MemberChanges) -> Result<Member, DomainError> {
        let mut tx = self.store.begin().await?;
        let mut member = find(&mut *tx, id).await?;

        let moved_to = changes.team_id;
        member.apply(changes);

        let mut errors = member.validate();
        if let Some(team) = moved_to {
            if tx.find_team(team).await?.is_none() {
                errors.add("team", MUST_EXIST);
            }
        }
        errors.into_result().map_err(DomainError::validation)?;

        tx.update_member(&member).await?;
        tx.commit().await?;

        info!(id = %member.id(), team_id = %member.team_id(), "Updated member");
        Ok(member)
    }

    /// Delete a member and its project links
    pub async fn delete(&self, id: MemberId) -> Result<(), DomainError> {
        let mut tx = self.store.begin().await?;

        destroy_member(&mut *tx, id).await?;
        tx.commit().await?;

        info!(id = %id, "Deleted member");
        Ok(())
    }
}

fn missing(id: MemberId) -> DomainError {
    DomainError::not_found(format!("Member '{}' not found", id))
}

async fn find(tx: &mut dyn Transaction, id: MemberId) -> Result<Member, DomainError> {
    tx.find_member(id).await?.ok_or_else(|| missing(id))
}
