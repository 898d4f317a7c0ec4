//! Stable JSON representations of each entity
//!
//! Field order is part of the contract: the structs below are serialized in
//! declaration order and both output formats are built from them.

use serde::Serialize;

use crate::domain::{Member, MemberId, Team, TeamId};
use crate::infrastructure::member::TeamChoice;
use crate::infrastructure::project::ProjectDetails;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamView {
    pub id: TeamId,
    pub name: String,
}

impl From<&Team> for TeamView {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id(),
            name: team.name().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberView {
    pub id: MemberId,
    pub first_name: String,
    pub last_name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub team_id: TeamId,
}

impl From<&Member> for MemberView {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id(),
            first_name: member.first_name().to_string(),
            last_name: member.last_name().to_string(),
            city: member.city().map(String::from),
            state: member.state().map(String::from),
            country: member.country().map(String::from),
            team_id: member.team_id(),
        }
    }
}

/// Project with its embedded members; an empty project has `members: []`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectView {
    pub id: crate::domain::ProjectId,
    pub name: String,
    pub members: Vec<MemberView>,
}

impl From<&ProjectDetails> for ProjectView {
    fn from(details: &ProjectDetails) -> Self {
        Self {
            id: details.project.id(),
            name: details.project.name().to_string(),
            members: details.members.iter().map(MemberView::from).collect(),
        }
    }
}

/// A member and the teams it can be moved to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditTeamView {
    pub member: MemberView,
    pub teams: Vec<TeamView>,
}

impl From<&TeamChoice> for EditTeamView {
    fn from(choice: &TeamChoice) -> Self {
        Self {
            member: MemberView::from(&choice.member),
            teams: choice.teams.iter().map(TeamView::from).collect(),
        }
    }
}
