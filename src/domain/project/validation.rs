//! Project validation

use crate::domain::validation::ValidationErrors;

/// Validate a project name: it must be present
pub fn validate_project_name(name: Option<&str>) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.require("name", name);
    errors
}
