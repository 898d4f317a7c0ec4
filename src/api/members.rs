//! Member endpoints
//!
//! A member is addressed either directly (`/members/{id}`) or through its
//! team (`/teams/{id}/members/{member_id}`); [`MemberKey`] reads both shapes.

use std::collections::HashMap;

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::request::Parts,
    response::Response,
};
use serde::Deserialize;

use super::negotiation::{Negotiation, Outcome, PageMeta, Representation};
use super::state::AppState;
use super::teams::ListQuery;
use super::types::{ApiError, IdParam, Params, Rooted};
use super::views::{EditTeamView, MemberView};
use crate::domain::validation::MUST_EXIST;
use crate::domain::{
    DomainError, Location, Member, MemberChanges, MemberId, NewMember, TeamId, ValidationErrors,
};

pub const MEMBERS: &str = "/members";

/// Raw path segments naming a member, with the owning team when nested
///
/// Parsing is deferred to the handler so a malformed id is reported in the
/// requested format like any other miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberKey {
    member: String,
    team: Option<String>,
}

impl MemberKey {
    fn from_params(mut params: HashMap<String, String>) -> Option<Self> {
        match params.remove("member_id") {
            Some(member) => Some(Self {
                member,
                team: params.remove("id"),
            }),
            None => params.remove("id").map(|member| Self { member, team: None }),
        }
    }

    pub fn resolve(&self) -> Result<(Option<TeamId>, MemberId), DomainError> {
        let team = self.team.as_deref().map(TeamId::parse).transpose()?;
        Ok((team, MemberId::parse(&self.member)?))
    }
}

impl<S> FromRequestParts<S> for MemberKey
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

        Self::from_params(params).ok_or_else(|| ApiError::bad_request("Missing member id"))
    }
}

/// Member fields accepted on create and update
#[derive(Debug, Default, Deserialize)]
pub struct MemberParams {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub team_id: Option<IdParam>,
}

impl Rooted for MemberParams {
    const ROOT: &'static str = "member";
}

impl MemberParams {
    /// A new member of `team`; a `team_id` in the body is ignored
    pub fn into_new_member(self, team: TeamId) -> NewMember {
        NewMember::new(
            team,
            self.first_name.unwrap_or_default(),
            self.last_name.unwrap_or_default(),
        )
        .with_location(Location {
            city: self.city,
            state: self.state,
            country: self.country,
        })
    }

    /// Supplied fields only; a `team_id` that is not an id fails like a missing team
    pub fn into_changes(self) -> Result<MemberChanges, DomainError> {
        let team_id = match self.team_id {
            Some(raw) => match raw.as_i64() {
                Some(id) => Some(TeamId::new(id)),
                None => {
                    return Err(DomainError::validation(ValidationErrors::single(
                        "team", MUST_EXIST,
                    )));
                }
            },
            None => None,
        };

        Ok(MemberChanges {
            first_name: self.first_name,
            last_name: self.last_name,
            city: self.city,
            state: self.state,
            country: self.country,
            team_id,
        })
    }
}

fn member_path(team: Option<TeamId>, member: MemberId) -> String {
    match team {
        Some(team) => format!("/teams/{}/members/{}", team, member),
        None => format!("{}/{}", MEMBERS, member),
    }
}

/// Where a failed request on this member goes back to
fn fallback(key: &MemberKey) -> String {
    match &key.team {
        Some(team) => format!("/teams/{}/members", team),
        None => MEMBERS.to_string(),
    }
}

async fn load(state: &AppState, team: Option<TeamId>, id: MemberId) -> Result<Member, DomainError> {
    match team {
        Some(team) => state.member_service.get_in_team(team, id).await,
        None => state.member_service.get(id).await,
    }
}

/// GET /members
pub async fn list_members(
    State(state): State<AppState>,
    negotiation: Negotiation,
    Query(query): Query<ListQuery>,
) -> Response {
    let result: Result<Outcome, ApiError> = async {
        let members = state.member_service.list(query.page_request()).await?;
        let meta = PageMeta::from(&members);
        let views: Vec<MemberView> = members.items.iter().map(MemberView::from).collect();

        let repr = Representation::new("Members", &views)?.linked(MEMBERS);
        Ok(Outcome::Page(repr, meta))
    }
    .await;

    negotiation.reply(result, "/")
}

/// GET /members/{id} and GET /teams/{id}/members/{member_id}
pub async fn show_member(
    State(state): State<AppState>,
    negotiation: Negotiation,
    key: MemberKey,
) -> Response {
    let result: Result<Outcome, ApiError> = async {
        let (team, id) = key.resolve()?;
        let member = load(&state, team, id).await?;

        let repr = Representation::new(member.full_name(), &MemberView::from(&member))?
            .link("Change team", format!("{}/{}/edit_team", MEMBERS, id))
            .link("Team", format!("/teams/{}", member.team_id()))
            .link("Back", fallback(&key));
        Ok(Outcome::Show(repr))
    }
    .await;

    negotiation.reply(result, &fallback(&key))
}

/// PUT/PATCH /members/{id} and the team-scoped equivalent
pub async fn update_member(
    State(state): State<AppState>,
    negotiation: Negotiation,
    key: MemberKey,
    payload: Result<Params<MemberParams>, ApiError>,
) -> Response {
    let result: Result<Outcome, ApiError> = async {
        let (team, id) = key.resolve()?;
        if let Some(team) = team {
            state.member_service.get_in_team(team, id).await?;
        }

        let Params(params) = payload?;
        let member = state.member_service.update(id, params.into_changes()?).await?;

        // A moved member is no longer reachable through its old team
        let location = match team {
            Some(team) if team == member.team_id() => member_path(Some(team), id),
            _ => member_path(None, id),
        };

        Outcome::updated(
            "Member was successfully updated.",
            location,
            &MemberView::from(&member),
        )
    }
    .await;

    negotiation.reply(result, &fallback(&key))
}

/// DELETE /members/{id} and the team-scoped equivalent
pub async fn delete_member(
    State(state): State<AppState>,
    negotiation: Negotiation,
    key: MemberKey,
) -> Response {
    let result: Result<Outcome, ApiError> = async {
        let (team, id) = key.resolve()?;
        if let Some(team) = team {
            state.member_service.get_in_team(team, id).await?;
        }

        state.member_service.delete(id).await?;
        Ok(Outcome::deleted("Member was successfully destroyed.", fallback(&key)))
    }
    .await;

    negotiation.reply(result, &fallback(&key))
}

/// GET /members/{member_id}/edit_team
pub async fn edit_team(
    State(state): State<AppState>,
    negotiation: Negotiation,
    key: MemberKey,
) -> Response {
    let result: Result<Outcome, ApiError> = async {
        let (_, id) = key.resolve()?;
        let choice = state.member_service.team_choice(id).await?;

        let repr = Representation::new(
            format!("Change team for {}", choice.member.full_name()),
            &EditTeamView::from(&choice),
        )?
        .link("Back", member_path(None, id));
        Ok(Outcome::Show(repr))
    }
    .await;

    negotiation.reply(result, MEMBERS)
}
