//! Team domain module
//!
//! Teams own their members: deleting a team deletes every member in it.

mod entity;
mod repository;
mod validation;

pub use entity::{NewTeam, Team, TeamChanges, TeamId};
pub use repository::TeamRepository;
pub use validation::validate_team_name;
