//! CLI module for Roster
//!
//! Provides subcommands:
//! - `serve`: run the HTTP server
//! - `migrate`: apply pending PostgreSQL migrations and exit

pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

/// Roster - teams, members and projects
#[derive(Parser)]
#[command(name = "roster")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve,

    /// Run pending PostgreSQL migrations and exit
    Migrate(migrate::MigrateArgs),
}
