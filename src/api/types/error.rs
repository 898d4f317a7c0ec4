//! API error types and their JSON bodies

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, ValidationErrors};

/// Error categories carried in the `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorType {
    InvalidRequestError,
    NotFoundError,
    ValidationError,
    DeleteError,
    ServerError,
}

impl std::fmt::Display for ApiErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequestError => write!(f, "invalid_request_error"),
            Self::NotFoundError => write!(f, "not_found_error"),
            Self::ValidationError => write!(f, "validation_error"),
            Self::DeleteError => write!(f, "delete_error"),
            Self::ServerError => write!(f, "server_error"),
        }
    }
}

/// Error body: `{"error": {"message": ..., "type": ...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

/// Error detail structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: ApiErrorType,
}

/// API error with status code
///
/// Validation failures keep their field map; the JSON body is then the map
/// itself rather than the generic error envelope.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
    pub fields: Option<ValidationErrors>,
}

impl ApiError {
    pub fn new(status: StatusCode, error_type: ApiErrorType, message: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                error: ApiErrorDetail {
                    message: message.into(),
                    error_type,
                },
            },
            fields: None,
        }
    }

    /// Bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiErrorType::InvalidRequestError, message)
    }

    /// Unsupported body encoding
    pub fn unsupported_media_type(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiErrorType::InvalidRequestError,
            message,
        )
    }

    /// Not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ApiErrorType::NotFoundError, message)
    }

    /// Field-level validation failure
    pub fn validation(errors: ValidationErrors) -> Self {
        let mut err = Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiErrorType::ValidationError,
            errors.to_string(),
        );
        err.fields = Some(errors);
        err
    }

    /// A delete whose cascade could not complete
    pub fn delete_failed(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, ApiErrorType::DeleteError, message)
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ApiErrorType::ServerError, message)
    }

    pub fn message(&self) -> &str {
        &self.response.error.message
    }

    pub fn error_type(&self) -> ApiErrorType {
        self.response.error.error_type
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.fields {
            Some(fields) => (self.status, Json(fields)).into_response(),
            None => (self.status, Json(self.response)).into_response(),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { message } => Self::not_found(message),
            DomainError::Validation(errors) => Self::validation(errors),
            DomainError::DeleteFailure { message } => Self::delete_failed(message),
            DomainError::Storage { message } => {
                tracing::error!(error = %message, "Storage failure");
                Self::internal(message)
            }
            DomainError::Internal { message } => {
                tracing::error!(error = %message, "Internal failure");
                Self::internal(message)
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.response.error.error_type, self.response.error.message
        )
    }
}

impl std::error::Error for ApiError {}
