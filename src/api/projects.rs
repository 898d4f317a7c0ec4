//! Project endpoints and project membership

use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use serde::Deserialize;
use tracing::debug;

use super::negotiation::{Negotiation, Outcome, PageMeta, Representation};
use super::state::AppState;
use super::teams::ListQuery;
use super::types::{ApiError, IdList, IdParam, Json, Params, Payload, Rooted};
use super::views::{MemberView, ProjectView};
use crate::domain::validation::{BLANK, INVALID};
use crate::domain::{
    DomainError, MemberId, NewProject, ProjectChanges, ProjectId, ValidationErrors,
};

pub const PROJECTS: &str = "/projects";

/// Project fields accepted on create and update
#[derive(Debug, Default, Deserialize)]
pub struct ProjectParams {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub member_ids: Option<IdList>,
}

impl Rooted for ProjectParams {
    const ROOT: &'static str = "project";
}

impl ProjectParams {
    fn member_ids(&self) -> Result<Option<Vec<MemberId>>, DomainError> {
        let Some(list) = &self.member_ids else {
            return Ok(None);
        };

        match list.ids() {
            Some(ids) => Ok(Some(ids.into_iter().map(MemberId::new).collect())),
            None => Err(DomainError::validation(ValidationErrors::single(
                "member_ids",
                INVALID,
            ))),
        }
    }

    pub fn into_new_project(self) -> Result<NewProject, DomainError> {
        let members = self.member_ids()?.unwrap_or_default();
        Ok(NewProject::new(self.name.unwrap_or_default()).with_members(members))
    }

    pub fn into_changes(self) -> Result<ProjectChanges, DomainError> {
        let member_ids = self.member_ids()?;
        Ok(ProjectChanges {
            name: self.name,
            member_ids,
        })
    }
}

/// Body of `POST /projects/{id}/add_member`
#[derive(Debug, Default, Deserialize)]
pub struct AddMemberParams {
    #[serde(default)]
    pub member_id: Option<IdParam>,
}

impl AddMemberParams {
    fn member(&self) -> Result<MemberId, DomainError> {
        let raw = match &self.member_id {
            Some(raw) if !raw.is_blank() => raw,
            _ => {
                return Err(DomainError::validation(ValidationErrors::single(
                    "member_id",
                    BLANK,
                )));
            }
        };

        MemberId::parse(&raw.raw())
    }
}

fn project_path(id: ProjectId) -> String {
    format!("{}/{}", PROJECTS, id)
}

/// GET /projects
pub async fn list_projects(
    State(state): State<AppState>,
    negotiation: Negotiation,
    Query(query): Query<ListQuery>,
) -> Response {
    let result: Result<Outcome, ApiError> = async {
        let projects = state.project_service.list(query.page_request()).await?;
        let meta = PageMeta::from(&projects);
        let views: Vec<ProjectView> = projects.items.iter().map(ProjectView::from).collect();

        let repr = Representation::new("Projects", &views)?.linked(PROJECTS);
        Ok(Outcome::Page(repr, meta))
    }
    .await;

    negotiation.reply(result, "/")
}

/// GET /projects/{id}
pub async fn show_project(
    State(state): State<AppState>,
    negotiation: Negotiation,
    Path(id): Path<String>,
) -> Response {
    let result: Result<Outcome, ApiError> = async {
        let details = state.project_service.get(ProjectId::parse(&id)?).await?;

        let repr = Representation::new(details.project.name(), &ProjectView::from(&details))?
            .linked(PROJECTS)
            .link("Back", PROJECTS);
        Ok(Outcome::Show(repr))
    }
    .await;

    negotiation.reply(result, PROJECTS)
}

/// POST /projects
pub async fn create_project(
    State(state): State<AppState>,
    negotiation: Negotiation,
    payload: Result<Params<ProjectParams>, ApiError>,
) -> Response {
    let result: Result<Outcome, ApiError> = async {
        let Params(params) = payload?;
        let details = state
            .project_service
            .create(params.into_new_project()?)
            .await?;

        Outcome::created(
            "Project was successfully created.",
            "project",
            project_path(details.project.id()),
            &ProjectView::from(&details),
        )
    }
    .await;

    negotiation.reply(result, PROJECTS)
}

/// PUT/PATCH /projects/{id}
pub async fn update_project(
    State(state): State<AppState>,
    negotiation: Negotiation,
    Path(id): Path<String>,
    payload: Result<Params<ProjectParams>, ApiError>,
) -> Response {
    let result: Result<Outcome, ApiError> = async {
        let id = ProjectId::parse(&id)?;
        let Params(params) = payload?;
        let details = state
            .project_service
            .update(id, params.into_changes()?)
            .await?;

        Outcome::updated(
            "Project was successfully updated.",
            project_path(id),
            &ProjectView::from(&details),
        )
    }
    .await;

    negotiation.reply(result, PROJECTS)
}

/// DELETE /projects/{id}
pub async fn delete_project(
    State(state): State<AppState>,
    negotiation: Negotiation,
    Path(id): Path<String>,
) -> Response {
    let result: Result<Outcome, ApiError> = async {
        state.project_service.delete(ProjectId::parse(&id)?).await?;
        Ok(Outcome::deleted("Project was successfully destroyed.", PROJECTS))
    }
    .await;

    negotiation.reply(result, PROJECTS)
}

/// POST /projects/{id}/add_member
pub async fn add_member(
    State(state): State<AppState>,
    negotiation: Negotiation,
    Path(id): Path<String>,
    payload: Result<Payload<AddMemberParams>, ApiError>,
) -> Response {
    let result: Result<Outcome, ApiError> = async {
        let id = ProjectId::parse(&id)?;
        let Payload(params) = payload?;
        let details = state.project_service.add_member(id, params.member()?).await?;

        Outcome::updated(
            "Member was successfully added to the project.",
            project_path(id),
            &ProjectView::from(&details),
        )
    }
    .await;

    negotiation.reply(result, PROJECTS)
}

/// GET /projects/{id}/members
///
/// Always JSON, whatever format is requested.
pub async fn project_members(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<MemberView>>, ApiError> {
    let id = ProjectId::parse(&id)?;
    let members = state.project_service.members(id).await?;
    debug!(project_id = %id, count = members.len(), "Loaded project members");

    Ok(Json(members.iter().map(MemberView::from).collect()))
}
