//! Project service: validate-then-write operations on projects and their members

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::lifecycle::{destroy_project, link_member, replace_members};
use crate::domain::validation::{INVALID, TAKEN};
use crate::domain::{
    DomainError, Member, MemberId, MemberRepository, NewProject, Page, PageRequest, Project,
    ProjectChanges, ProjectId, ProjectRepository, Store, Transaction, ValidationErrors,
};

/// A project with its members in link order
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDetails {
    pub project: Project,
    pub members: Vec<Member>,
}

/// Project service for managing projects
#[derive(Debug, Clone)]
pub struct ProjectService {
    store: Arc<dyn Store>,
}

impl ProjectService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// One page of projects, each with its members
    pub async fn list(&self, page: PageRequest) -> Result<Page<ProjectDetails>, DomainError> {
        let mut tx = self.store.begin().await?;

        let total = tx.count_projects().await?;
        let projects = tx.list_projects(page).await?;

        let mut details = Vec::with_capacity(projects.len());
        for project in projects {
            details.push(load_members(&mut *tx, project).await?);
        }
        debug!(page = page.page(), total, "Listed projects");

        Ok(Page::new(details, page, total))
    }

    pub async fn get(&self, id: ProjectId) -> Result<ProjectDetails, DomainError> {
        let mut tx = self.store.begin().await?;

        let project = find(&mut *tx, id).await?;
        load_members(&mut *tx, project).await
    }

    /// Members of a project, in link order
    pub async fn members(&self, id: ProjectId) -> Result<Vec<Member>, DomainError> {
        Ok(self.get(id).await?.members)
    }

    /// Create a project, linking the requested members
    pub async fn create(&self, project: NewProject) -> Result<ProjectDetails, DomainError> {
        let mut tx = self.store.begin().await?;

        let mut errors = project.validate();
        if errors.is_empty() && tx.project_name_taken(&project.name, None).await? {
            errors.add("name", TAKEN);
        }
        errors.extend(check_members(&mut *tx, &project.member_ids).await?);
        errors.into_result().map_err(DomainError::validation)?;

        let created = tx.insert_project(&project).await?;
        replace_members(&mut *tx, created.id(), &project.member_ids).await?;
        let details = load_members(&mut *tx, created).await?;
        tx.commit().await?;

        info!(
            id = %details.project.id(),
            name = %details.project.name(),
            members = details.members.len(),
            "Created project"
        );
        Ok(details)
    }

    /// Apply the supplied fields; `member_ids`, when given, replaces the member set
    pub async fn update(
        &self,
        id: ProjectId,
        changes: ProjectChanges,
    ) -> Result<ProjectDetails, DomainError> {
        let mut tx = self.store.begin().await?;
        let mut project = find(&mut *tx, id).await?;

        project.apply(&changes);

        let mut errors = project.validate();
        if errors.is_empty()
            && changes.name.is_some()
            && tx.project_name_taken(project.name(), Some(id)).await?
        {
            errors.add("name", TAKEN);
        }
        if let Some(member_ids) = &changes.member_ids {
            errors.extend(check_members(&mut *tx, member_ids).await?);
        }
        errors.into_result().map_err(DomainError::validation)?;

        tx.update_project(&project).await?;
        if let Some(member_ids) = &changes.member_ids {
            replace_members(&mut *tx, id, member_ids).await?;
        }
        let details = load_members(&mut *tx, project).await?;
        tx.commit().await?;

        info!(id = %id, name = %details.project.name(), "Updated project");
        Ok(details)
    }

    /// Delete a project; its membership rows stay behind with the project cleared
    pub async fn delete(&self, id: ProjectId) -> Result<(), DomainError> {
        let mut tx = self.store.begin().await?;

        destroy_project(&mut *tx, id).await?;
        tx.commit().await?;

        info!(id = %id, "Deleted project");
        Ok(())
    }

    /// Link one member to the project unless already linked
    pub async fn add_member(
        &self,
        id: ProjectId,
        member: MemberId,
    ) -> Result<ProjectDetails, DomainError> {
        let mut tx = self.store.begin().await?;
        let project = find(&mut *tx, id).await?;

        if tx.find_member(member).await?.is_none() {
            return Err(DomainError::not_found(format!("Member '{}' not found", member)));
        }

        let linked = link_member(&mut *tx, id, member).await?;
        let details = load_members(&mut *tx, project).await?;
        tx.commit().await?;

        info!(id = %id, member_id = %member, linked, "Added member to project");
        Ok(details)
    }
}

async fn find(tx: &mut dyn Transaction, id: ProjectId) -> Result<Project, DomainError> {
    tx.find_project(id)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("Project '{}' not found", id)))
}

async fn load_members(
    tx: &mut dyn Transaction,
    project: Project,
) -> Result<ProjectDetails, DomainError> {
    let members = tx.members_of_project(project.id()).await?;
    Ok(ProjectDetails { project, members })
}

/// Every requested member must exist
async fn check_members(
    tx: &mut dyn Transaction,
    member_ids: &[MemberId],
) -> Result<ValidationErrors, DomainError> {
    let mut errors = ValidationErrors::new();

    for id in member_ids {
        if tx.find_member(*id).await?.is_none() {
            errors.add("member_ids", INVALID);
            break;
        }
    }

    Ok(errors)
}
