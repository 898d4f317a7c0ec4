//! Team service: validate-then-write operations on teams

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::lifecycle::destroy_team;
use crate::domain::validation::TAKEN;
use crate::domain::{
    DomainError, Member, MemberRepository, NewTeam, Page, PageRequest, Store, Team, TeamChanges,
    TeamId, TeamRepository, Transaction,
};

/// Team service for managing teams
#[derive(Debug, Clone)]
pub struct TeamService {
    store: Arc<dyn Store>,
}

impl TeamService {
    /// Create a new team service
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// One page of teams in insertion order
    pub async fn list(&self, page: PageRequest) -> Result<Page<Team>, DomainError> {
        let mut tx = self.store.begin().await?;

        let total = tx.count_teams().await?;
        let teams = tx.list_teams(page).await?;
        debug!(page = page.page(), total, "Listed teams");

        Ok(Page::new(teams, page, total))
    }

    /// Every team, for pickers
    pub async fn all(&self) -> Result<Vec<Team>, DomainError> {
        let mut tx = self.store.begin().await?;
        tx.all_teams().await
    }

    /// Get a team by ID
    pub async fn get(&self, id: TeamId) -> Result<Team, DomainError> {
        let mut tx = self.store.begin().await?;
        find(&mut *tx, id).await
    }

    /// Members of a team, in insertion order
    pub async fn members(&self, id: TeamId) -> Result<Vec<Member>, DomainError> {
        let mut tx = self.store.begin().await?;

        find(&mut *tx, id).await?;
        tx.members_of_team(id).await
    }

    /// Create a new team
    pub async fn create(&self, team: NewTeam) -> Result<Team, DomainError> {
        let mut tx = self.store.begin().await?;

        let mut errors = team.validate();
        if errors.is_empty() && tx.team_name_taken(&team.name, None).await? {
            errors.add("name", TAKEN);
        }
        errors.into_result().map_err(DomainError::validation)?;

        let team = tx.insert_team(team).await?;
        tx.commit().await?;

        info!(id = %team.id(), name = %team.name(), "Created team");
        Ok(team)
    }

    /// Apply the supplied fields to a team
    pub async fn update(&self, id: TeamId, changes: TeamChanges) -> Result<Team, DomainError> {
        let mut tx = self.store.begin().await?;
        let mut team = find(&mut *tx, id).await?;

        let renamed = changes.name.is_some();
        team.apply(changes);

        let mut errors = team.validate();
        if errors.is_empty() && renamed && tx.team_name_taken(team.name(), Some(id)).await? {
            errors.add("name", TAKEN);
        }
        errors.into_result().map_err(DomainError::validation)?;

        tx.update_team(&team).await?;
        tx.commit().await?;

        info!(id = %team.id(), name = %team.name(), "Updated team");
        Ok(team)
    }

    /// Delete a team together with its members and their project links
    pub async fn delete(&self, id: TeamId) -> Result<(), DomainError> {
        let mut tx = self.store.begin().await?;

        destroy_team(&mut *tx, id).await?;
        tx.commit().await?;

        info!(id = %id, "Deleted team");
        Ok(())
    }
}

async fn find(tx: &mut dyn Transaction, id: TeamId) -> Result<Team, DomainError> {
    tx.find_team(id)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("Team '{}' not found", id)))
}
