//! Data models for authentication
//!
//! - `User`: the stored identity record
//! - `NewUser`: a record not yet assigned an id
//! - Request/response bodies of the user and session endpoints
//!
//! Request and response bodies use camelCase field names on the wire.

use marquee_core::{normalize_email, Role, UserId};
use serde::{Deserialize, Serialize};

/// User account record
///
/// `email` is always stored in normalized (case-folded) form. The password
/// hash is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Surrogate id assigned by the credential store, immutable
    pub id: UserId,

    /// Normalized email, the login handle
    pub email: String,

    /// Scheme-tagged password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Assigned role
    pub role: Role,
}

/// User to be persisted; the store assigns the id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

impl NewUser {
    /// New user with the default role, email normalized
    pub fn new(email: &str, password_hash: impl Into<String>) -> Self {
        Self {
            email: normalize_email(email),
            password_hash: password_hash.into(),
            role: Role::default(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

/// Body of registration and profile update requests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    pub email_address: String,
    pub password: String,
}

impl UserRequest {
    /// Reject blank fields
    pub fn validate(&self) -> Result<(), String> {
        if self.email_address.trim().is_empty() {
            return Err("emailAddress must not be blank".to_string());
        }
        if self.password.is_empty() {
            return Err("password must not be blank".to_string());
        }
        Ok(())
    }
}

/// Body of the login request
pub type AuthenticationRequest = UserRequest;

/// Login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticationResponse {
    pub token: String,
}

/// Public view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: UserId,
    pub email_address: String,
    pub role: Role,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email_address: user.email.clone(),
            role: user.role,
        }
    }
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}
