//! PostgreSQL store with connection pooling
//!
//! One request maps to one database transaction. Rows are always returned
//! in id order so pages are stable across requests.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row};

use crate::domain::validation::TAKEN;
use crate::domain::{
    DomainError, Location, Member, MemberId, MemberRepository, MembershipId,
    MembershipRepository, NewMember, NewProject, NewTeam, PageRequest, Project, ProjectId,
    ProjectMember, ProjectRepository, Store, Team, TeamId, TeamRepository, Transaction,
    ValidationErrors,
};

/// PostgreSQL store configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/roster".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }
}

/// PostgreSQL-backed store
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool
    pub async fn connect(config: &PostgresConfig) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))?;

        Ok(Self::new(pool))
    }

    /// Returns a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>, DomainError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to open transaction: {}", e)))?;

        Ok(Box::new(PostgresTransaction { tx }))
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

/// A live database transaction; rolled back by sqlx when dropped uncommitted
pub struct PostgresTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

impl PostgresTransaction {
    fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }
}

fn query_failed(action: &str) -> impl FnOnce(sqlx::Error) -> DomainError + '_ {
    move |e| DomainError::storage(format!("Failed to {}: {}", action, e))
}

/// Unique index races surface like the application-level check
fn write_failed<'a>(action: &'a str, field: &'static str) -> impl FnOnce(sqlx::Error) -> DomainError + 'a {
    move |e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DomainError::validation(ValidationErrors::single(field, TAKEN))
        }
        _ => DomainError::storage(format!("Failed to {}: {}", action, e)),
    }
}

/// LIMIT and OFFSET binds; an offset past `i64::MAX` still selects nothing
fn page_bounds(page: PageRequest) -> (i64, i64) {
    let limit = i64::try_from(page.limit()).unwrap_or(i64::MAX);
    let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
    (limit, offset)
}

fn decode_failed(e: sqlx::Error) -> DomainError {
    DomainError::storage(format!("Failed to decode row: {}", e))
}

fn team_from_row(row: &PgRow) -> Result<Team, DomainError> {
    Ok(Team::restore(
        TeamId::new(row.try_get("id").map_err(decode_failed)?),
        row.try_get::<String, _>("name").map_err(decode_failed)?,
        row.try_get("created_at").map_err(decode_failed)?,
        row.try_get("updated_at").map_err(decode_failed)?,
    ))
}

fn member_from_row(row: &PgRow) -> Result<Member, DomainError> {
    let team_id = TeamId::new(row.try_get("team_id").map_err(decode_failed)?);
    let first_name: String = row.try_get("first_name").map_err(decode_failed)?;
    let last_name: String = row.try_get("last_name").map_err(decode_failed)?;
    let location = Location {
        city: row.try_get("city").map_err(decode_failed)?,
        state: row.try_get("state").map_err(decode_failed)?,
        country: row.try_get("country").map_err(decode_failed)?,
    };

    Ok(Member::restore(
        MemberId::new(row.try_get("id").map_err(decode_failed)?),
        NewMember::new(team_id, first_name, last_name).with_location(location),
        row.try_get("created_at").map_err(decode_failed)?,
        row.try_get("updated_at").map_err(decode_failed)?,
    ))
}

fn project_from_row(row: &PgRow) -> Result<Project, DomainError> {
    Ok(Project::restore(
        ProjectId::new(row.try_get("id").map_err(decode_failed)?),
        row.try_get::<String, _>("name").map_err(decode_failed)?,
        row.try_get("created_at").map_err(decode_failed)?,
        row.try_get("updated_at").map_err(decode_failed)?,
    ))
}

fn membership_from_row(row: &PgRow) -> Result<ProjectMember, DomainError> {
    let project_id: Option<i64> = row.try_get("project_id").map_err(decode_failed)?;
    let member_id: Option<i64> = row.try_get("member_id").map_err(decode_failed)?;

    Ok(ProjectMember::restore(
        MembershipId::new(row.try_get("id").map_err(decode_failed)?),
        project_id.map(ProjectId::new),
        member_id.map(MemberId::new),
        row.try_get("created_at").map_err(decode_failed)?,
        row.try_get("updated_at").map_err(decode_failed)?,
    ))
}

fn collect<T>(
    rows: Vec<PgRow>,
    decode: fn(&PgRow) -> Result<T, DomainError>,
) -> Result<Vec<T>, DomainError> {
    rows.iter().map(decode).collect()
}

const MEMBER_COLUMNS: &str =
    "m.id, m.first_name, m.last_name, m.city, m.state, m.country, m.team_id, m.created_at, m.updated_at";

#[async_trait]
impl Transaction for PostgresTransaction {
    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        self.tx
            .commit()
            .await
            .map_err(query_failed("commit transaction"))
    }
}

#[async_trait]
impl TeamRepository for PostgresTransaction {
    async fn find_team(&mut self, id: TeamId) -> Result<Option<Team>, DomainError> {
        let row = sqlx::query("SELECT id, name, created_at, updated_at FROM teams WHERE id = $1")
            .bind(id.value())
            .fetch_optional(self.conn())
            .await
            .map_err(query_failed("get team"))?;

        row.as_ref().map(team_from_row).transpose()
    }

    async fn list_teams(&mut self, page: PageRequest) -> Result<Vec<Team>, DomainError> {
        let (limit, offset) = page_bounds(page);
        let rows = sqlx::query(
            "SELECT id, name, created_at, updated_at FROM teams ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.conn())
        .await
        .map_err(query_failed("list teams"))?;

        collect(rows, team_from_row)
    }

    async fn all_teams(&mut self) -> Result<Vec<Team>, DomainError> {
        let rows = sqlx::query("SELECT id, name, created_at, updated_at FROM teams ORDER BY id")
            .fetch_all(self.conn())
            .await
            .map_err(query_failed("list teams"))?;

        collect(rows, team_from_row)
    }

    async fn count_teams(&mut self) -> Result<usize, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM teams")
            .fetch_one(self.conn())
            .await
            .map_err(query_failed("count teams"))?;

        Ok(count as usize)
    }

    async fn team_name_taken(
        &mut self,
        name: &str,
        except: Option<TeamId>,
    ) -> Result<bool, DomainError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM teams WHERE name = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(name)
        .bind(except.map(|id| id.value()))
        .fetch_one(self.conn())
        .await
        .map_err(query_failed("check team name"))
    }

    async fn insert_team(&mut self, team: NewTeam) -> Result<Team, DomainError> {
        let row = sqlx::query(
            "INSERT INTO teams (name) VALUES ($1) RETURNING id, name, created_at, updated_at",
        )
        .bind(&team.name)
        .fetch_one(self.conn())
        .await
        .map_err(write_failed("insert team", "name"))?;

        team_from_row(&row)
    }

    async fn update_team(&mut self, team: &Team) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE teams SET name = $2, updated_at = $3 WHERE id = $1")
            .bind(team.id().value())
            .bind(team.name())
            .bind(team.updated_at())
            .execute(self.conn())
            .await
            .map_err(write_failed("update team", "name"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("Team '{}' not found", team.id())));
        }

        Ok(())
    }

    async fn delete_team(&mut self, id: TeamId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id.value())
            .execute(self.conn())
            .await
            .map_err(query_failed("delete team"))?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl MemberRepository for PostgresTransaction {
    async fn find_member(&mut self, id: MemberId) -> Result<Option<Member>, DomainError> {
        let row = sqlx::query(&format!("SELECT {} FROM members m WHERE m.id = $1", MEMBER_COLUMNS))
            .bind(id.value())
            .fetch_optional(self.conn())
            .await
            .map_err(query_failed("get member"))?;

        row.as_ref().map(member_from_row).transpose()
    }

    async fn list_members(&mut self, page: PageRequest) -> Result<Vec<Member>, DomainError> {
        let (limit, offset) = page_bounds(page);
        let rows = sqlx::query(&format!(
            "SELECT {} FROM members m ORDER BY m.id LIMIT $1 OFFSET $2",
            MEMBER_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.conn())
        .await
        .map_err(query_failed("list members"))?;

        collect(rows, member_from_row)
    }

    async fn count_members(&mut self) -> Result<usize, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members")
            .fetch_one(self.conn())
            .await
            .map_err(query_failed("count members"))?;

        Ok(count as usize)
    }

    async fn members_of_team(&mut self, team: TeamId) -> Result<Vec<Member>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM members m WHERE m.team_id = $1 ORDER BY m.id",
            MEMBER_COLUMNS
        ))
        .bind(team.value())
        .fetch_all(self.conn())
        .await
        .map_err(query_failed("list team members"))?;

        collect(rows, member_from_row)
    }

    async fn members_of_project(
        &mut self,
        project: ProjectId,
    ) -> Result<Vec<Member>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM project_members pm \
             JOIN members m ON m.id = pm.member_id \
             WHERE pm.project_id = $1 ORDER BY pm.id",
            MEMBER_COLUMNS
        ))
        .bind(project.value())
        .fetch_all(self.conn())
        .await
        .map_err(query_failed("list project members"))?;

        collect(rows, member_from_row)
    }

    async fn insert_member(&mut self, member: NewMember) -> Result<Member, DomainError> {
        let row = sqlx::query(
            "INSERT INTO members (first_name, last_name, city, state, country, team_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, first_name, last_name, city, state, country, team_id, created_at, updated_at",
        )
        .bind(&member.first_name)
        .bind(&member.last_name)
        .bind(&member.location.city)
        .bind(&member.location.state)
        .bind(&member.location.country)
        .bind(member.team_id.value())
        .fetch_one(self.conn())
        .await
        .map_err(query_failed("insert member"))?;

        member_from_row(&row)
    }

    async fn update_member(&mut self, member: &Member) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE members SET first_name = $2, last_name = $3, city = $4, state = $5, \
             country = $6, team_id = $7, updated_at = $8 WHERE id = $1",
        )
        .bind(member.id().value())
        .bind(member.first_name())
        .bind(member.last_name())
        .bind(member.city())
        .bind(member.state())
        .bind(member.country())
        .bind(member.team_id().value())
        .bind(member.updated_at())
        .execute(self.conn())
        .await
        .map_err(query_failed("update member"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("Member '{}' not found", member.id())));
        }

        Ok(())
    }

    async fn delete_member(&mut self, id: MemberId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(id.value())
            .execute(self.conn())
            .await
            .map_err(query_failed("delete member"))?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ProjectRepository for PostgresTransaction {
    async fn find_project(&mut self, id: ProjectId) -> Result<Option<Project>, DomainError> {
        let row =
            sqlx::query("SELECT id, name, created_at, updated_at FROM projects WHERE id = $1")
                .bind(id.value())
                .fetch_optional(self.conn())
                .await
                .map_err(query_failed("get project"))?;

        row.as_ref().map(project_from_row).transpose()
    }

    async fn list_projects(&mut self, page: PageRequest) -> Result<Vec<Project>, DomainError> {
        let (limit, offset) = page_bounds(page);
        let rows = sqlx::query(
            "SELECT id, name, created_at, updated_at FROM projects ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.conn())
        .await
        .map_err(query_failed("list projects"))?;

        collect(rows, project_from_row)
    }

    async fn count_projects(&mut self) -> Result<usize, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects")
            .fetch_one(self.conn())
            .await
            .map_err(query_failed("count projects"))?;

        Ok(count as usize)
    }

    async fn project_name_taken(
        &mut self,
        name: &str,
        except: Option<ProjectId>,
    ) -> Result<bool, DomainError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM projects WHERE name = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(name)
        .bind(except.map(|id| id.value()))
        .fetch_one(self.conn())
        .await
        .map_err(query_failed("check project name"))
    }

    async fn insert_project(&mut self, project: &NewProject) -> Result<Project, DomainError> {
        let row = sqlx::query(
            "INSERT INTO projects (name) VALUES ($1) RETURNING id, name, created_at, updated_at",
        )
        .bind(&project.name)
        .fetch_one(self.conn())
        .await
        .map_err(write_failed("insert project", "name"))?;

        project_from_row(&row)
    }

    async fn update_project(&mut self, project: &Project) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE projects SET name = $2, updated_at = $3 WHERE id = $1")
            .bind(project.id().value())
            .bind(project.name())
            .bind(project.updated_at())
            .execute(self.conn())
            .await
            .map_err(write_failed("update project", "name"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "Project '{}' not found",
                project.id()
            )));
        }

        Ok(())
    }

    async fn delete_project(&mut self, id: ProjectId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id.value())
            .execute(self.conn())
            .await
            .map_err(query_failed("delete project"))?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl MembershipRepository for PostgresTransaction {
    async fn memberships_of_project(
        &mut self,
        project: ProjectId,
    ) -> Result<Vec<ProjectMember>, DomainError> {
        let rows = sqlx::query(
            "SELECT id, project_id, member_id, created_at, updated_at FROM project_members \
             WHERE project_id = $1 ORDER BY id",
        )
        .bind(project.value())
        .fetch_all(self.conn())
        .await
        .map_err(query_failed("list project memberships"))?;

        collect(rows, membership_from_row)
    }

    async fn memberships_of_member(
        &mut self,
        member: MemberId,
    ) -> Result<Vec<ProjectMember>, DomainError> {
        let rows = sqlx::query(
            "SELECT id, project_id, member_id, created_at, updated_at FROM project_members \
             WHERE member_id = $1 ORDER BY id",
        )
        .bind(member.value())
        .fetch_all(self.conn())
        .await
        .map_err(query_failed("list member memberships"))?;

        collect(rows, membership_from_row)
    }

    async fn all_memberships(&mut self) -> Result<Vec<ProjectMember>, DomainError> {
        let rows = sqlx::query(
            "SELECT id, project_id, member_id, created_at, updated_at FROM project_members ORDER BY id",
        )
        .fetch_all(self.conn())
        .await
        .map_err(query_failed("list memberships"))?;

        collect(rows, membership_from_row)
    }

    async fn insert_membership(
        &mut self,
        project: ProjectId,
        member: MemberId,
    ) -> Result<ProjectMember, DomainError> {
        let row = sqlx::query(
            "INSERT INTO project_members (project_id, member_id) VALUES ($1, $2) \
             RETURNING id, project_id, member_id, created_at, updated_at",
        )
        .bind(project.value())
        .bind(member.value())
        .fetch_one(self.conn())
        .await
        .map_err(query_failed("insert membership"))?;

        membership_from_row(&row)
    }

    async fn update_membership(&mut self, membership: &ProjectMember) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE project_members SET project_id = $2, member_id = $3, updated_at = $4 \
             WHERE id = $1",
        )
        .bind(membership.id().value())
        .bind(membership.project_id().map(|id| id.value()))
        .bind(membership.member_id().map(|id| id.value()))
        .bind(membership.updated_at())
        .execute(self.conn())
        .await
        .map_err(query_failed("update membership"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "Membership '{}' not found",
                membership.id()
            )));
        }

        Ok(())
    }

    async fn delete_membership(&mut self, id: MembershipId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM project_members WHERE id = $1")
            .bind(id.value())
            .execute(self.conn())
            .await
            .map_err(query_failed("delete membership"))?;

        Ok(result.rows_affected() > 0)
    }
}
