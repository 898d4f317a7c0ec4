//! Domain layer - Entities, validation rules and association lifecycle

pub mod error;
mod id;
pub mod lifecycle;
pub mod member;
pub mod membership;
pub mod page;
pub mod project;
pub mod store;
pub mod team;
pub mod validation;

pub use error::DomainError;
pub use member::{Location, Member, MemberChanges, MemberId, MemberRepository, NewMember};
pub use membership::{MembershipId, MembershipRepository, ProjectMember};
pub use page::{Page, PageRequest, PER_PAGE};
pub use project::{NewProject, Project, ProjectChanges, ProjectId, ProjectRepository};
pub use store::{Store, Transaction};
pub use team::{NewTeam, Team, TeamChanges, TeamId, TeamRepository};
pub use validation::ValidationErrors;
