//! Team validation

use crate::domain::validation::ValidationErrors;

/// Validate a team name: it must be present
pub fn validate_team_name(name: Option<&str>) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.require("name", name);
    errors
}
