//! Authentication and authorization error taxonomy
//!
//! Every failure of the auth core is one of these kinds, and each kind maps
//! to exactly one HTTP status. Token failures are kept apart internally so
//! they can be logged precisely, but all of them render the same 401 body.

use super::jwt::TokenError;
use super::password::PasswordError;
use super::repository::RepositoryError;
use crate::error::ApiError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use marquee_core::UserId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Unknown email or wrong password; the two are never distinguished
    #[error("Invalid email address or password")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Access denied")]
    Forbidden,

    #[error("A user with the e-mail address {0} is already registered.")]
    DuplicateEmail(String),

    #[error("Could not find user with id {0}")]
    UserNotFound(UserId),

    #[error("Stored credential is corrupt")]
    CorruptCredential,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Invalid token signature")]
    SignatureInvalid,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Credential store unavailable: {0}")]
    Storage(String),

    #[error("Internal authentication error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Caller-visible status for this kind
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials
            | AuthError::Unauthenticated
            | AuthError::MalformedToken
            | AuthError::SignatureInvalid
            | AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::DuplicateEmail(_) => StatusCode::CONFLICT,
            AuthError::UserNotFound(_) => StatusCode::NOT_FOUND,
            AuthError::CorruptCredential | AuthError::Storage(_) | AuthError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn api_error(&self) -> ApiError {
        match self {
            AuthError::InvalidCredentials => ApiError::new("UNAUTHORIZED", self.to_string()),
            AuthError::Unauthenticated
            | AuthError::MalformedToken
            | AuthError::SignatureInvalid
            | AuthError::TokenExpired => ApiError::unauthorized(),
            AuthError::Forbidden => ApiError::forbidden(),
            AuthError::DuplicateEmail(_) => ApiError::new("CONFLICT", self.to_string()),
            AuthError::UserNotFound(_) => ApiError::new("NOT_FOUND", self.to_string()),
            AuthError::CorruptCredential | AuthError::Storage(_) | AuthError::Internal(_) => {
                ApiError::internal_error()
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if self.status_code().is_server_error() {
            tracing::error!(error = %self, "Authentication failed with an internal error");
        }

        (self.status_code(), Json(self.api_error())).into_response()
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::MalformedToken => AuthError::MalformedToken,
            TokenError::SignatureInvalid => AuthError::SignatureInvalid,
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::Encoding(msg) => AuthError::Internal(msg),
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::CorruptCredential(_) => AuthError::CorruptCredential,
            PasswordError::HashingFailed(msg) | PasswordError::VerificationFailed(msg) => {
                AuthError::Internal(msg)
            }
        }
    }
}

impl From<RepositoryError> for AuthError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateEmail(email) => AuthError::DuplicateEmail(email),
            RepositoryError::NotFound(id) => AuthError::UserNotFound(id),
            RepositoryError::Database(msg) => AuthError::Storage(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (AuthError::MalformedToken, StatusCode::UNAUTHORIZED),
            (AuthError::SignatureInvalid, StatusCode::UNAUTHORIZED),
            (AuthError::TokenExpired, StatusCode::UNAUTHORIZED),
            (AuthError::Forbidden, StatusCode::FORBIDDEN),
            (
                AuthError::DuplicateEmail("a@b.c".to_string()),
                StatusCode::CONFLICT,
            ),
            (AuthError::UserNotFound(9), StatusCode::NOT_FOUND),
            (
                AuthError::CorruptCredential,
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AuthError::Storage("down".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.status_code(), status, "{error:?}");
        }
    }

    #[test]
    fn test_token_failures_render_identically() {
        let bodies: Vec<_> = [
            AuthError::Unauthenticated,
            AuthError::MalformedToken,
            AuthError::SignatureInvalid,
            AuthError::TokenExpired,
        ]
        .iter()
        .map(|e| serde_json::to_string(&e.api_error()).unwrap())
        .collect();

        assert!(bodies.windows(2).all(|w| w[0] == w[1]));
        assert!(bodies[0].contains("Authentication required"));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            AuthError::DuplicateEmail("jos@example.com".to_string()).to_string(),
            "A user with the e-mail address jos@example.com is already registered."
        );
        assert_eq!(
            AuthError::UserNotFound(2).to_string(),
            "Could not find user with id 2"
        );
    }

    #[test]
    fn test_conversions() {
        assert_eq!(
            AuthError::from(TokenError::Expired),
            AuthError::TokenExpired
        );
        assert_eq!(
            AuthError::from(PasswordError::CorruptCredential("x".to_string())),
            AuthError::CorruptCredential
        );
        assert_eq!(
            AuthError::from(RepositoryError::DuplicateEmail("a@b.c".to_string())),
            AuthError::DuplicateEmail("a@b.c".to_string())
        );
        assert_eq!(
            AuthError::from(RepositoryError::Database("io".to_string())),
            AuthError::Storage("io".to_string())
        );
    }

    #[test]
    fn test_internal_details_not_rendered() {
        let body =
            serde_json::to_string(&AuthError::Storage("password=hunter2".to_string()).api_error())
                .unwrap();
        assert!(!body.contains("hunter2"));
    }
}
