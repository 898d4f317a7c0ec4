//! Team endpoints, including the team-scoped member list and create

use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use serde::Deserialize;
use tracing::debug;

use super::members::MemberParams;
use super::negotiation::{Negotiation, Outcome, PageMeta, Representation};
use super::state::AppState;
use super::types::{ApiError, Params, Rooted};
use super::views::{MemberView, TeamView};
use crate::domain::{NewTeam, PageRequest, TeamChanges, TeamId};

pub const TEAMS: &str = "/teams";

/// Query parameters shared by every paged list
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub page: Option<String>,
}

impl ListQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::parse(self.page.as_deref())
    }
}

/// Team fields accepted on create and update
#[derive(Debug, Default, Deserialize)]
pub struct TeamParams {
    #[serde(default)]
    pub name: Option<String>,
}

impl Rooted for TeamParams {
    const ROOT: &'static str = "team";
}

fn team_path(id: TeamId) -> String {
    format!("{}/{}", TEAMS, id)
}

/// GET /teams (and GET /)
pub async fn list_teams(
    State(state): State<AppState>,
    negotiation: Negotiation,
    Query(query): Query<ListQuery>,
) -> Response {
    let result = team_page(&state, query.page_request()).await;
    negotiation.reply(result, "/")
}

async fn team_page(state: &AppState, page: PageRequest) -> Result<Outcome, ApiError> {
    let teams = state.team_service.list(page).await?;
    let meta = PageMeta::from(&teams);
    let views: Vec<TeamView> = teams.items.iter().map(TeamView::from).collect();

    let repr = Representation::new("Teams", &views)?.linked(TEAMS);
    Ok(Outcome::Page(repr, meta))
}

/// GET /teams/{id}
pub async fn show_team(
    State(state): State<AppState>,
    negotiation: Negotiation,
    Path(id): Path<String>,
) -> Response {
    let result: Result<Outcome, ApiError> = async {
        let team = state.team_service.get(TeamId::parse(&id)?).await?;
        let path = team_path(team.id());

        let repr = Representation::new(team.name(), &TeamView::from(&team))?
            .linked(TEAMS)
            .link("Members", format!("{}/members", path))
            .link("Back", TEAMS);
        Ok(Outcome::Show(repr))
    }
    .await;

    negotiation.reply(result, TEAMS)
}

/// POST /teams
pub async fn create_team(
    State(state): State<AppState>,
    negotiation: Negotiation,
    payload: Result<Params<TeamParams>, ApiError>,
) -> Response {
    let result: Result<Outcome, ApiError> = async {
        let Params(params) = payload?;
        let team = state
            .team_service
            .create(NewTeam::new(params.name.unwrap_or_default()))
            .await?;

        Outcome::created(
            "Team was successfully created.",
            "team",
            team_path(team.id()),
            &TeamView::from(&team),
        )
    }
    .await;

    negotiation.reply(result, TEAMS)
}

/// PUT/PATCH /teams/{id}
pub async fn update_team(
    State(state): State<AppState>,
    negotiation: Negotiation,
    Path(id): Path<String>,
    payload: Result<Params<TeamParams>, ApiError>,
) -> Response {
    let result: Result<Outcome, ApiError> = async {
        let id = TeamId::parse(&id)?;
        let Params(params) = payload?;
        let team = state
            .team_service
            .update(id, TeamChanges { name: params.name })
            .await?;

        Outcome::updated(
            "Team was successfully updated.",
            team_path(team.id()),
            &TeamView::from(&team),
        )
    }
    .await;

    negotiation.reply(result, TEAMS)
}

/// DELETE /teams/{id}
pub async fn delete_team(
    State(state): State<AppState>,
    negotiation: Negotiation,
    Path(id): Path<String>,
) -> Response {
    let result: Result<Outcome, ApiError> = async {
        state.team_service.delete(TeamId::parse(&id)?).await?;
        Ok(Outcome::deleted("Team was successfully destroyed.", TEAMS))
    }
    .await;

    negotiation.reply(result, TEAMS)
}

/// GET /teams/{id}/members
pub async fn team_members(
    State(state): State<AppState>,
    negotiation: Negotiation,
    Path(id): Path<String>,
) -> Response {
    let result: Result<Outcome, ApiError> = async {
        let id = TeamId::parse(&id)?;
        let team = state.team_service.get(id).await?;
        let members = state.team_service.members(id).await?;
        debug!(team_id = %id, count = members.len(), "Loaded team members");

        let views: Vec<MemberView> = members.iter().map(MemberView::from).collect();
        let base = format!("{}/members", team_path(id));
        let repr = Representation::new(format!("Members of {}", team.name()), &views)?
            .linked(base)
            .link("Back", team_path(id));
        Ok(Outcome::Show(repr))
    }
    .await;

    negotiation.reply(result, TEAMS)
}

/// POST /teams/{id}/members
pub async fn create_team_member(
    State(state): State<AppState>,
    negotiation: Negotiation,
    Path(id): Path<String>,
    payload: Result<Params<MemberParams>, ApiError>,
) -> Response {
    let result: Result<Outcome, ApiError> = async {
        let team = TeamId::parse(&id)?;
        let Params(params) = payload?;
        let member = state
            .member_service
            .create(params.into_new_member(team))
            .await?;

        Outcome::created(
            "Member was successfully created.",
            "member",
            format!("{}/members/{}", team_path(team), member.id()),
            &MemberView::from(&member),
        )
    }
    .await;

    negotiation.reply(result, TEAMS)
}
