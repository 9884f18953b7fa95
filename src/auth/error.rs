use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Outcomes of the auth operations that the HTTP layer can surface.
///
/// Lookup failure and password mismatch are deliberately collapsed into one
/// `InvalidCredentials` variant so callers cannot enumerate registered
/// emails. Storage and hashing failures surface as a generic `Internal`
/// with no detail in the response body.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("Email already registered.")]
    DuplicateEmail,
    #[error("Invalid email or password.")]
    InvalidCredentials,
    #[error("Internal server error.")]
    Internal,
}

impl From<StoreError> for AuthError {
    fn from(_: StoreError) -> Self {
        AuthError::Internal
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::DuplicateEmail => StatusCode::CONFLICT,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}
