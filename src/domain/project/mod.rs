//! Project domain module

mod entity;
mod repository;
mod validation;

pub use entity::{NewProject, Project, ProjectChanges, ProjectId};
pub use repository::ProjectRepository;
pub use validation::validate_project_name;
