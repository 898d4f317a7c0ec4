//! Migrate command - applies the PostgreSQL schema

use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::logging;
use crate::infrastructure::storage::{run_migrations, PostgresConfig, PostgresMigrator, PostgresStore};

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Overrides `storage.database_url` and `DATABASE_URL`
    #[arg(long)]
    pub database_url: Option<String>,
}

/// Run pending migrations against the configured database
pub async fn run(args: MigrateArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&config.logging);

    let url = args
        .database_url
        .or_else(|| config.storage.resolve_database_url())
        .ok_or_else(|| anyhow::anyhow!("No database URL: pass --database-url or set DATABASE_URL"))?;

    let store = PostgresStore::connect(&PostgresConfig::new(url).with_max_connections(1)).await?;
    let applied = run_migrations(store.pool()).await?;
    let version = PostgresMigrator::new(store.pool().clone()).current_version().await?;

    info!(applied, version = ?version, "Migrations complete");
    Ok(())
}
