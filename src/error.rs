use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// ApiError
///
/// The full failure taxonomy of the access-control core. Authentication failures
/// (the four credential variants) are distinguishable internally for observability
/// but all collapse to the same opaque 401 on the wire, so a caller cannot probe
/// which stage of the gate rejected it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    // --- Authentication Gate ---
    #[error("authorization header absent")]
    MissingCredential,
    #[error("authorization header is not a bearer token")]
    MalformedCredential,
    #[error("bearer token expired")]
    ExpiredCredential,
    #[error("bearer token rejected")]
    InvalidCredential,

    // --- Role Gate ---
    #[error("role not permitted for this operation")]
    InsufficientRole,

    // --- Resource Scoping ---
    #[error("resource not found")]
    NotFound,
    #[error("access to this resource is denied")]
    Forbidden,
    /// Every missing referenced id is reported, not just the first encountered.
    #[error("referenced ids do not exist")]
    DanglingReference(Vec<Uuid>),

    // --- Credential exchange (login/register) ---
    #[error("invalid email or password")]
    InvalidLogin,
    #[error("email already registered")]
    EmailTaken,

    // Unexpected storage or signing failures. Context is logged at the wrap
    // site; the caller only ever sees a generic body.
    #[error("internal error")]
    Internal,
}

impl ApiError {
    /// Wraps an unexpected storage failure: logs the operation context, hides the detail.
    pub fn storage(operation: &'static str, err: sqlx::Error) -> Self {
        tracing::error!(operation, error = ?err, "storage failure");
        ApiError::Internal
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MissingCredential
            | ApiError::MalformedCredential
            | ApiError::ExpiredCredential
            | ApiError::InvalidCredential => {
                // The internal distinction only surfaces in logs.
                tracing::debug!(reason = %self, "authentication rejected");
                StatusCode::UNAUTHORIZED
            }
            ApiError::InvalidLogin => StatusCode::UNAUTHORIZED,
            ApiError::InsufficientRole | ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::DanglingReference(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::EmailTaken => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            ApiError::MissingCredential
            | ApiError::MalformedCredential
            | ApiError::ExpiredCredential
            | ApiError::InvalidCredential => json!({ "error": "unauthorized" }),
            ApiError::DanglingReference(missing) => {
                json!({ "error": "referenced ids do not exist", "missing": missing })
            }
            ApiError::Internal => json!({ "error": "internal server error" }),
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
