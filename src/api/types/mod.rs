//! Request and response types shared by every handler

pub mod error;
pub mod json;
pub mod payload;

pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use json::Json;
pub use payload::{IdList, IdParam, Params, Payload, Rooted};
