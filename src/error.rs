use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// ApiError
///
/// The client-facing failure taxonomy. Every handler failure is translated
/// into one of these classes at the request boundary; nothing is retried
/// server-side. The distinction between `Forbidden` and `NotFound` is
/// deliberate: a write against an existing record the caller lacks rights to
/// is 403, and 404 is reserved for records that do not exist.
#[derive(Debug, Error, PartialEq)]
pub enum ApiError {
    /// Actor lacks rights for the action.
    #[error("{0}")]
    Forbidden(String),

    /// Malformed input or an illegal state transition.
    #[error("{0}")]
    Validation(String),

    /// Uniqueness violation (duplicate application or review).
    #[error("{0}")]
    Conflict(String),

    /// Referenced job/application/review does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Persistence failure. The underlying cause is logged at the call site;
    /// the client only sees a generic message.
    #[error("Internal server error.")]
    Internal,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "detail": self.to_string() }));
        (self.status_code(), body).into_response()
    }
}
