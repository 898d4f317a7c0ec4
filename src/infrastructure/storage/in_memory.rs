//! In-memory store implementation

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::{
    DomainError, Member, MemberId, MemberRepository, MembershipId, MembershipRepository,
    NewMember, NewProject, NewTeam, PageRequest, Project, ProjectId, ProjectMember,
    ProjectRepository, Store, Team, TeamId, TeamRepository, Transaction,
};

/// A write that can be made to fail on purpose
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    DeleteMember,
    DeleteMembership,
    UpdateMembership,
}

#[derive(Debug, Clone, Default)]
struct Sequences {
    team: i64,
    member: i64,
    project: i64,
    membership: i64,
}

fn next(sequence: &mut i64) -> i64 {
    *sequence += 1;
    *sequence
}

/// Every table; keyed by id so iteration follows insertion order
#[derive(Debug, Clone, Default)]
struct Tables {
    teams: BTreeMap<TeamId, Team>,
    members: BTreeMap<MemberId, Member>,
    projects: BTreeMap<ProjectId, Project>,
    memberships: BTreeMap<MembershipId, ProjectMember>,
    sequences: Sequences,
}

/// Thread-safe in-memory store
///
/// Useful for testing and development. Data is lost when the process
/// terminates. Transactions are serialized: one holds the tables until it
/// is committed or dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
    failure: Option<FailurePoint>,
}

impl InMemoryStore {
    /// Creates a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every transaction opened through this handle fail at `point`
    pub fn with_failure(mut self, point: FailurePoint) -> Self {
        self.failure = Some(point);
        self
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>, DomainError> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();

        Ok(Box::new(InMemoryTransaction {
            guard,
            working,
            failure: self.failure,
        }))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Works on a private copy of the tables and publishes it on commit
pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    failure: Option<FailurePoint>,
}

impl InMemoryTransaction {
    fn check(&self, point: FailurePoint) -> Result<(), DomainError> {
        if self.failure == Some(point) {
            return Err(DomainError::storage(format!("Injected failure at {:?}", point)));
        }
        Ok(())
    }
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        let Self {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }
}

#[async_trait]
impl TeamRepository for InMemoryTransaction {
    async fn find_team(&mut self, id: TeamId) -> Result<Option<Team>, DomainError> {
        Ok(self.working.teams.get(&id).cloned())
    }

    async fn list_teams(&mut self, page: PageRequest) -> Result<Vec<Team>, DomainError> {
        let rows: Vec<Team> = self.working.teams.values().cloned().collect();
        Ok(page.slice(&rows))
    }

    async fn all_teams(&mut self) -> Result<Vec<Team>, DomainError> {
        Ok(self.working.teams.values().cloned().collect())
    }

    async fn count_teams(&mut self) -> Result<usize, DomainError> {
        Ok(self.working.teams.len())
    }

    async fn team_name_taken(
        &mut self,
        name: &str,
        except: Option<TeamId>,
    ) -> Result<bool, DomainError> {
        Ok(self
            .working
            .teams
            .values()
            .any(|t| t.name() == name && Some(t.id()) != except))
    }

    async fn insert_team(&mut self, team: NewTeam) -> Result<Team, DomainError> {
        let id = TeamId::new(next(&mut self.working.sequences.team));
        let team = Team::from_new(id, team);

        self.working.teams.insert(id, team.clone());
        Ok(team)
    }

    async fn update_team(&mut self, team: &Team) -> Result<(), DomainError> {
        match self.working.teams.get_mut(&team.id()) {
            Some(row) => {
                *row = team.clone();
                Ok(())
            }
            None => Err(DomainError::not_found(format!("Team '{}' not found", team.id()))),
        }
    }

    async fn delete_team(&mut self, id: TeamId) -> Result<bool, DomainError> {
        Ok(self.working.teams.remove(&id).is_some())
    }
}

#[async_trait]
impl MemberRepository for InMemoryTransaction {
    async fn find_member(&mut self, id: MemberId) -> Result<Option<Member>, DomainError> {
        Ok(self.working.members.get(&id).cloned())
    }

    async fn list_members(&mut self, page: PageRequest) -> Result<Vec<Member>, DomainError> {
        let rows: Vec<Member> = self.working.members.values().cloned().collect();
        Ok(page.slice(&rows))
    }

    async fn count_members(&mut self) -> Result<usize, DomainError> {
        Ok(self.working.members.len())
    }

    async fn members_of_team(&mut self, team: TeamId) -> Result<Vec<Member>, DomainError> {
        Ok(self
            .working
            .members
            .values()
            .filter(|m| m.team_id() == team)
            .cloned()
            .collect())
    }

    async fn members_of_project(
        &mut self,
        project: ProjectId,
    ) -> Result<Vec<Member>, DomainError> {
        let tables = &self.working;

        Ok(tables
            .memberships
            .values()
            .filter(|link| link.project_id() == Some(project))
            .filter_map(|link| link.member_id())
            .filter_map(|id| tables.members.get(&id).cloned())
            .collect())
    }

    async fn insert_member(&mut self, member: NewMember) -> Result<Member, DomainError> {
        let id = MemberId::new(next(&mut self.working.sequences.member));
        let member = Member::from_new(id, member);

        self.working.members.insert(id, member.clone());
        Ok(member)
    }

    async fn update_member(&mut self, member: &Member) -> Result<(), DomainError> {
        match self.working.members.get_mut(&member.id()) {
            Some(row) => {
                *row = member.clone();
                Ok(())
            }
            None => Err(DomainError::not_found(format!(
                "Member '{}' not found",
                member.id()
            ))),
        }
    }

    async fn delete_member(&mut self, id: MemberId) -> Result<bool, DomainError> {
        self.check(FailurePoint::DeleteMember)?;
        Ok(self.working.members.remove(&id).is_some())
    }
}

#[async_trait]
impl ProjectRepository for InMemoryTransaction {
    async fn find_project(&mut self, id: ProjectId) -> Result<Option<Project>, DomainError> {
        Ok(self.working.projects.get(&id).cloned())
    }

    async fn list_projects(&mut self, page: PageRequest) -> Result<Vec<Project>, DomainError> {
        let rows: Vec<Project> = self.working.projects.values().cloned().collect();
        Ok(page.slice(&rows))
    }

    async fn count_projects(&mut self) -> Result<usize, DomainError> {
        Ok(self.working.projects.len())
    }

    async fn project_name_taken(
        &mut self,
        name: &str,
        except: Option<ProjectId>,
    ) -> Result<bool, DomainError> {
        Ok(self
            .working
            .projects
            .values()
            .any(|p| p.name() == name && Some(p.id()) != except))
    }

    async fn insert_project(&mut self, project: &NewProject) -> Result<Project, DomainError> {
        let id = ProjectId::new(next(&mut self.working.sequences.project));
        let project = Project::from_new(id, project);

        self.working.projects.insert(id, project.clone());
        Ok(project)
    }

    async fn update_project(&mut self, project: &Project) -> Result<(), DomainError> {
        match self.working.projects.get_mut(&project.id()) {
            Some(row) => {
                *row = project.clone();
                Ok(())
            }
            None => Err(DomainError::not_found(format!(
                "Project '{}' not found",
                project.id()
            ))),
        }
    }

    async fn delete_project(&mut self, id: ProjectId) -> Result<bool, DomainError> {
        Ok(self.working.projects.remove(&id).is_some())
    }
}

#[async_trait]
impl MembershipRepository for InMemoryTransaction {
    async fn memberships_of_project(
        &mut self,
        project: ProjectId,
    ) -> Result<Vec<ProjectMember>, DomainError> {
        Ok(self
            .working
            .memberships
            .values()
            .filter(|link| link.project_id() == Some(project))
            .cloned()
            .collect())
    }

    async fn memberships_of_member(
        &mut self,
        member: MemberId,
    ) -> Result<Vec<ProjectMember>, DomainError> {
        Ok(self
            .working
            .memberships
            .values()
            .filter(|link| link.member_id() == Some(member))
            .cloned()
            .collect())
    }

    async fn all_memberships(&mut self) -> Result<Vec<ProjectMember>, DomainError> {
        Ok(self.working.memberships.values().cloned().collect())
    }

    async fn insert_membership(
        &mut self,
        project: ProjectId,
        member: MemberId,
    ) -> Result<ProjectMember, DomainError> {
        let id = MembershipId::new(next(&mut self.working.sequences.membership));
        let link = ProjectMember::link(id, project, member);

        self.working.memberships.insert(id, link.clone());
        Ok(link)
    }

    async fn update_membership(&mut self, membership: &ProjectMember) -> Result<(), DomainError> {
        self.check(FailurePoint::UpdateMembership)?;

        match self.working.memberships.get_mut(&membership.id()) {
            Some(row) => {
                *row = membership.clone();
                Ok(())
            }
            None => Err(DomainError::not_found(format!(
                "Membership '{}' not found",
                membership.id()
            ))),
        }
    }

    async fn delete_membership(&mut self, id: MembershipId) -> Result<bool, DomainError> {
        self.check(FailurePoint::DeleteMembership)?;
        Ok(self.working.memberships.remove(&id).is_some())
    }
}
