use thiserror::Error;

use super::validation::ValidationErrors;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Delete failed: {message}")]
    DeleteFailure { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }

    pub fn delete_failure(message: impl Into<String>) -> Self {
        Self::DeleteFailure {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true for a missing row
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = DomainError::not_found("Team 7 not found");
        assert_eq!(error.to_string(), "Not found: Team 7 not found");
        assert!(error.is_not_found());
    }

    #[test]
    fn test_validation_error() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "can't be blank");

        let error = DomainError::validation(errors);
        assert_eq!(error.to_string(), "Validation failed: name can't be blank");
        assert!(!error.is_not_found());
    }

    #[test]
    fn test_delete_failure_error() {
        let error = DomainError::delete_failure("store rejected the write");
        assert_eq!(error.to_string(), "Delete failed: store rejected the write");
    }
}
