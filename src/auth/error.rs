use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use super::dto::MessageResponse;

pub const INTERNAL_MESSAGE: &str = "Internal Server Error!";

/// Outcomes of the auth operations, each mapped to a status and a
/// `{"message"}` body at the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("Email already exists")]
    Conflict,

    /// Unknown email and wrong password share this variant.
    #[error("Invalid Credentials")]
    Credentials,

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("Image upload timed out")]
    UploadTimeout,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("session token signing failed")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("upstream failure")]
    Upstream(#[source] anyhow::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) | AuthError::Conflict | AuthError::Credentials => {
                StatusCode::BAD_REQUEST
            }
            AuthError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AuthError::UploadTimeout => StatusCode::GATEWAY_TIMEOUT,
            AuthError::Hashing(_) | AuthError::Token(_) | AuthError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(e: anyhow::Error) -> Self {
        AuthError::Upstream(e)
    }
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                AuthError::Validation("Expected a JSON request body")
            }
            _ => AuthError::Validation("Invalid request body"),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AuthError::Hashing(_) | AuthError::Token(_) => {
                error!(error = %self, "auth failure");
                INTERNAL_MESSAGE.to_string()
            }
            AuthError::Upstream(e) => {
                error!(error = ?e, "upstream failure");
                INTERNAL_MESSAGE.to_string()
            }
            AuthError::UploadTimeout => {
                error!("profile picture upload timed out");
                self.to_string()
            }
            _ => self.to_string(),
        };
        (status, Json(MessageResponse { message })).into_response()
    }
}
