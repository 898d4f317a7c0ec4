//! Roster
//!
//! Teams, their members, and the projects members work on:
//! - Paged CRUD over HTML and JSON from the same handlers
//! - Cascading and nullifying deletes run inside one store transaction
//! - In-memory or PostgreSQL storage

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use anyhow::{anyhow, Context};
use tracing::info;

use api::state::AppState;
use config::StorageSettings;
use infrastructure::storage::{PostgresConfig, StoreConfig, StoreFactory, StoreType};

/// Translate the storage settings into a store configuration
pub fn store_config(settings: &StorageSettings) -> anyhow::Result<StoreConfig> {
    let store_type = StoreType::from_str(&settings.backend)
        .ok_or_else(|| anyhow!("Unknown storage backend '{}'", settings.backend))?;

    match store_type {
        StoreType::InMemory => Ok(StoreConfig::in_memory()),
        StoreType::Postgres => {
            let url = settings
                .resolve_database_url()
                .context("storage.database_url or DATABASE_URL is required for postgres")?;

            Ok(StoreConfig::Postgres(
                PostgresConfig::new(url).with_max_connections(settings.max_connections),
            ))
        }
    }
}

/// Build the store and the services on top of it
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let store_config = store_config(&config.storage)?;
    let store = StoreFactory::create(&store_config)
        .await
        .context("Failed to open store")?;

    info!(backend = store.backend(), "Store ready");
    Ok(AppState::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_config_defaults_to_memory() {
        let config = store_config(&StorageSettings::default()).unwrap();
        assert_eq!(config.store_type(), StoreType::InMemory);
    }

    #[test]
    fn test_store_config_rejects_unknown_backend() {
        let settings = StorageSettings {
            backend: "sqlite".to_string(),
            ..Default::default()
        };
        assert!(store_config(&settings).is_err());
    }

    #[test]
    fn test_postgres_uses_configured_url() {
        let settings = StorageSettings {
            backend: "postgres".to_string(),
            database_url: Some("postgres://db/roster".to_string()),
            max_connections: 4,
        };

        match store_config(&settings).unwrap() {
            StoreConfig::Postgres(pg) => {
                assert_eq!(pg.url, "postgres://db/roster");
                assert_eq!(pg.max_connections, 4);
            }
            other => panic!("expected postgres config, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_app_state_in_memory() {
        let state = tokio_test::assert_ok!(create_app_state(&AppConfig::default()).await);
        assert_eq!(state.store.backend(), "memory");
    }
}
