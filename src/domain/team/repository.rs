//! Team repository trait

use async_trait::async_trait;

use super::entity::{NewTeam, Team, TeamId};
use crate::domain::page::PageRequest;
use crate::domain::DomainError;

/// Row-level access to the teams table inside a transaction
#[async_trait]
pub trait TeamRepository: Send {
    /// Get a team by ID
    async fn find_team(&mut self, id: TeamId) -> Result<Option<Team>, DomainError>;

    /// One page of teams in insertion order
    async fn list_teams(&mut self, page: PageRequest) -> Result<Vec<Team>, DomainError>;

    /// Every team in insertion order
    async fn all_teams(&mut self) -> Result<Vec<Team>, DomainError>;

    /// Count all teams
    async fn count_teams(&mut self) -> Result<usize, DomainError>;

    /// Whether another team already holds this exact name
    async fn team_name_taken(
        &mut self,
        name: &str,
        except: Option<TeamId>,
    ) -> Result<bool, DomainError>;

    /// Insert a validated team and assign its ID
    async fn insert_team(&mut self, team: NewTeam) -> Result<Team, DomainError>;

    /// Overwrite an existing team row
    async fn update_team(&mut self, team: &Team) -> Result<(), DomainError>;

    /// Delete a team row, returns true if it existed
    async fn delete_team(&mut self, id: TeamId) -> Result<bool, DomainError>;
}
