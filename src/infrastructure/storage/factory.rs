//! Store factory for runtime backend selection

use std::sync::Arc;

use tracing::info;

use crate::domain::{DomainError, Store};

use super::in_memory::InMemoryStore;
use super::migrations::run_migrations;
use super::postgres::{PostgresConfig, PostgresStore};

/// Supported store backends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreType {
    /// In-memory store (for testing/development)
    InMemory,
    /// PostgreSQL store
    Postgres,
}

impl StoreType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            _ => None,
        }
    }
}

/// Store configuration
#[derive(Debug, Clone)]
pub enum StoreConfig {
    InMemory,
    Postgres(PostgresConfig),
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    /// Creates a PostgreSQL configuration from a URL
    pub fn postgres_url(url: impl Into<String>) -> Self {
        Self::Postgres(PostgresConfig::new(url))
    }

    pub fn store_type(&self) -> StoreType {
        match self {
            Self::InMemory => StoreType::InMemory,
            Self::Postgres(_) => StoreType::Postgres,
        }
    }
}

/// Factory for creating store instances
#[derive(Debug)]
pub struct StoreFactory;

impl StoreFactory {
    /// Creates a store; PostgreSQL stores are migrated before use
    pub async fn create(config: &StoreConfig) -> Result<Arc<dyn Store>, DomainError> {
        match config {
            StoreConfig::InMemory => Ok(Arc::new(InMemoryStore::new())),
            StoreConfig::Postgres(pg_config) => {
                let store = PostgresStore::connect(pg_config).await?;
                let applied = run_migrations(store.pool()).await?;
                info!(applied, "PostgreSQL schema up to date");
                Ok(Arc::new(store))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_type_from_str() {
        assert_eq!(StoreType::from_str("memory"), Some(StoreType::InMemory));
        assert_eq!(StoreType::from_str("In-Memory"), Some(StoreType::InMemory));
        assert_eq!(StoreType::from_str("postgres"), Some(StoreType::Postgres));
        assert_eq!(StoreType::from_str("pg"), Some(StoreType::Postgres));
        assert_eq!(StoreType::from_str("unknown"), None);
    }

    #[test]
    fn test_store_config_types() {
        assert_eq!(StoreConfig::in_memory().store_type(), StoreType::InMemory);
        assert_eq!(
            StoreConfig::postgres_url("postgres://localhost/test").store_type(),
            StoreType::Postgres
        );
    }

    #[tokio::test]
    async fn test_create_in_memory() {
        let store = StoreFactory::create(&StoreConfig::in_memory()).await.unwrap();
        assert_eq!(store.backend(), "memory");
    }
}
