//! Database migrations infrastructure

use sqlx::postgres::PgPool;
use tracing::info;

use crate::domain::DomainError;

/// Applies and reverts versioned schema migrations, recording them in `_migrations`
#[derive(Debug)]
pub struct PostgresMigrator {
    pool: PgPool,
}

impl PostgresMigrator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the migrations table if it doesn't exist
    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create migrations table: {}", e)))?;

        Ok(())
    }

    async fn is_applied(&self, version: i64) -> Result<bool, DomainError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM _migrations WHERE version = $1)")
            .bind(version)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to check migration status: {}", e)))
    }

    /// Runs a single migration; returns false when it was already applied
    pub async fn run_migration(&self, migration: &Migration) -> Result<bool, DomainError> {
        self.ensure_migrations_table().await?;

        if self.is_applied(migration.version).await? {
            return Ok(false);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to open transaction: {}", e)))?;

        sqlx::raw_sql(migration.up).execute(&mut *tx).await.map_err(|e| {
            DomainError::storage(format!("Failed to run migration {}: {}", migration.version, e))
        })?;

        sqlx::query("INSERT INTO _migrations (version, description) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(migration.description)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to record migration {}: {}",
                    migration.version, e
                ))
            })?;

        tx.commit().await.map_err(|e| {
            DomainError::storage(format!("Failed to commit migration {}: {}", migration.version, e))
        })?;

        info!(version = migration.version, description = migration.description, "Applied migration");
        Ok(true)
    }

    /// Reverts a single migration
    pub async fn revert_migration(&self, migration: &Migration) -> Result<(), DomainError> {
        self.ensure_migrations_table().await?;

        if !self.is_applied(migration.version).await? {
            return Ok(());
        }

        sqlx::raw_sql(migration.down)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to revert migration {}: {}",
                    migration.version, e
                ))
            })?;

        sqlx::query("DELETE FROM _migrations WHERE version = $1")
            .bind(migration.version)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to remove migration record {}: {}",
                    migration.version, e
                ))
            })?;

        info!(version = migration.version, "Reverted migration");
        Ok(())
    }

    /// Returns the latest applied migration version
    pub async fn current_version(&self) -> Result<Option<i64>, DomainError> {
        self.ensure_migrations_table().await?;

        sqlx::query_scalar::<_, Option<i64>>("SELECT MAX(version) FROM _migrations")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get migration version: {}", e)))
    }
}

/// A versioned schema change
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    /// SQL to run when applying the migration
    pub up: &'static str,
    /// SQL to run when reverting the migration
    pub down: &'static str,
}

impl Migration {
    pub const fn new(
        version: i64,
        description: &'static str,
        up: &'static str,
        down: &'static str,
    ) -> Self {
        Self {
            version,
            description,
            up,
            down,
        }
    }
}

/// Schema for teams, members, projects and their join rows
///
/// Foreign keys carry no ON DELETE action: cascades and nullification run in
/// the application, inside the request transaction.
pub fn schema_migrations() -> Vec<Migration> {
    vec![
        Migration::new(
            1,
            "Create teams table",
            r#"
            CREATE TABLE IF NOT EXISTS teams (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE UNIQUE INDEX IF NOT EXISTS index_teams_on_name ON teams(name);
            "#,
            "DROP TABLE IF EXISTS teams;",
        ),
        Migration::new(
            2,
            "Create members table",
            r#"
            CREATE TABLE IF NOT EXISTS members (
                id BIGSERIAL PRIMARY KEY,
                first_name VARCHAR NOT NULL,
                last_name VARCHAR NOT NULL,
                city VARCHAR,
                state VARCHAR,
                country VARCHAR,
                team_id BIGINT NOT NULL REFERENCES teams(id),
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE INDEX IF NOT EXISTS index_members_on_team_id ON members(team_id);
            "#,
            "DROP TABLE IF EXISTS members;",
        ),
        Migration::new(
            3,
            "Create projects table",
            r#"
            CREATE TABLE IF NOT EXISTS projects (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE UNIQUE INDEX IF NOT EXISTS index_projects_on_name ON projects(name);
            "#,
            "DROP TABLE IF EXISTS projects;",
        ),
        Migration::new(
            4,
            "Create project_members table",
            r#"
            CREATE TABLE IF NOT EXISTS project_members (
                id BIGSERIAL PRIMARY KEY,
                project_id BIGINT REFERENCES projects(id),
                member_id BIGINT REFERENCES members(id),
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE INDEX IF NOT EXISTS index_project_members_on_project_id
                ON project_members(project_id);
            CREATE INDEX IF NOT EXISTS index_project_members_on_member_id
                ON project_members(member_id);
            "#,
            "DROP TABLE IF EXISTS project_members;",
        ),
    ]
}

/// Runs all pending schema migrations, returning how many were applied
pub async fn run_migrations(pool: &PgPool) -> Result<usize, DomainError> {
    let migrator = PostgresMigrator::new(pool.clone());
    let mut applied = 0;

    for migration in schema_migrations() {
        if migrator.run_migration(&migration).await? {
            applied += 1;
        }
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_ascending() {
        let migrations = schema_migrations();

        assert_eq!(migrations.len(), 4);
        for pair in migrations.windows(2) {
            assert!(pair[1].version > pair[0].version);
        }
    }

    #[test]
    fn test_migrations_content() {
        for migration in schema_migrations() {
            assert!(!migration.description.is_empty());
            assert!(migration.up.contains("CREATE TABLE"));
            assert!(migration.down.contains("DROP TABLE"));
        }
    }

    #[test]
    fn test_schema_leaves_cascades_to_application() {
        for migration in schema_migrations() {
            assert!(!migration.up.contains("ON DELETE"));
        }
    }

    #[test]
    fn test_join_table_sides_are_nullable() {
        let join = schema_migrations()
            .into_iter()
            .find(|m| m.up.contains("project_members ("))
            .unwrap();

        assert!(join.up.contains("project_id BIGINT REFERENCES"));
        assert!(join.up.contains("member_id BIGINT REFERENCES"));
    }
}
