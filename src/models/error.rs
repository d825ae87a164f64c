use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use thiserror::Error as ThisError;
use tracing::{error, warn};

use super::dto::Message;
use crate::database::StoreError;

/// HTTP-facing error: a status code plus a JSON `{"message"}` body.
#[derive(Debug)]
pub struct Error {
    pub code: StatusCode,
    pub body: Json<Message>,
}

impl Error {
    pub fn new(code: StatusCode, message: &str) -> Self {
        Self {
            code,
            body: Json(Message::new(message)),
        }
    }

    fn internal(detail: &dyn std::fmt::Display) -> Self {
        error!(error = %detail, "Responding with 500");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.code, self.body).into_response()
    }
}

impl From<(StatusCode, &str)> for Error {
    fn from((code, msg): (StatusCode, &str)) -> Self {
        Self::new(code, msg)
    }
}

/// Outcome of a failed authentication or authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum AuthError {
    #[error("Not authenticated")]
    Unauthenticated,
    #[error("Permission denied")]
    PermissionDenied,
}

impl From<AuthError> for Error {
    fn from(error: AuthError) -> Self {
        warn!(error = %error, "Rejecting request");
        let code = match error {
            AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::PermissionDenied => StatusCode::FORBIDDEN,
        };
        Self::new(code, &error.to_string())
    }
}

impl From<StoreError> for Error {
    fn from(error: StoreError) -> Self {
        let code = match &error {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::DuplicateNumber(_) => StatusCode::CONFLICT,
            StoreError::InvalidAmount(_)
            | StoreError::InvalidTransfer
            | StoreError::InsufficientFunds => StatusCode::BAD_REQUEST,
            StoreError::Persistence(e) => return Self::internal(e),
        };
        warn!(error = %error, status = code.as_u16(), "Store rejected request");
        Self::new(code, &error.to_string())
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, &rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, &rejection.body_text())
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        Self::internal(&error)
    }
}

impl From<argon2::password_hash::errors::Error> for Error {
    fn from(error: argon2::password_hash::errors::Error) -> Self {
        Self::internal(&error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_map_to_401_and_403() {
        assert_eq!(
            Error::from(AuthError::Unauthenticated).code,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            Error::from(AuthError::PermissionDenied).code,
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn client_faults_are_separated_from_backend_faults() {
        assert_eq!(
            Error::from(StoreError::InsufficientFunds).code,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::from(StoreError::InvalidAmount(0)).code,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::from(StoreError::NotFound("gone".into())).code,
            StatusCode::NOT_FOUND
        );

        let backend = Error::from(StoreError::Persistence(sqlx::Error::PoolTimedOut));
        assert_eq!(backend.code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(backend.body.0.message, "Internal server error");
    }
}
