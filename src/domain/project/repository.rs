//! Project repository trait

use async_trait::async_trait;

use super::entity::{NewProject, Project, ProjectId};
use crate::domain::page::PageRequest;
use crate::domain::DomainError;

/// Row-level access to the projects table inside a transaction
#[async_trait]
pub trait ProjectRepository: Send {
    async fn find_project(&mut self, id: ProjectId) -> Result<Option<Project>, DomainError>;

    /// One page of projects in insertion order
    async fn list_projects(&mut self, page: PageRequest) -> Result<Vec<Project>, DomainError>;

    async fn count_projects(&mut self) -> Result<usize, DomainError>;

    /// Whether another project already holds this exact name
    async fn project_name_taken(
        &mut self,
        name: &str,
        except: Option<ProjectId>,
    ) -> Result<bool, DomainError>;

    /// Insert the project row only; member links are written separately
    async fn insert_project(&mut self, project: &NewProject) -> Result<Project, DomainError>;

    async fn update_project(&mut self, project: &Project) -> Result<(), DomainError>;

    /// Delete a project row, returns true if it existed
    async fn delete_project(&mut self, id: ProjectId) -> Result<bool, DomainError>;
}
