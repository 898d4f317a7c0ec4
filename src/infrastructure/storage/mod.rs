//! Storage infrastructure - Store backends

mod factory;
mod in_memory;
pub mod migrations;
mod postgres;

pub use factory::{StoreConfig, StoreFactory, StoreType};
pub use in_memory::{FailurePoint, InMemoryStore};
pub use migrations::{run_migrations, Migration, PostgresMigrator};
pub use postgres::{PostgresConfig, PostgresStore};
