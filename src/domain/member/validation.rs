//! Member validation

use crate::domain::validation::ValidationErrors;

/// Both name fields must be present; one message per blank field
pub fn validate_member_names(first_name: Option<&str>, last_name: Option<&str>) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.require("first_name", first_name);
    errors.require("last_name", last_name);
    errors
}
