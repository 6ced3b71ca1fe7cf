//! Marquee Core - configuration and shared identity types
//!
//! This crate holds the pieces every other marquee crate agrees on:
//! - Configuration management (`config`)
//! - The role hierarchy (`Role`) and its set expansion
//! - Email normalization, the single definition of "same login handle"

pub mod config;

pub use config::{
    AppConfig, ConfigError, DatabaseConfig, JwtConfig, LoggingConfig, PasswordConfig,
    ServerConfig, TokenSettings,
};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Stable surrogate identifier of a user, assigned by the credential store
pub type UserId = i64;

// ============================================================================
// Roles
// ============================================================================

/// User role
///
/// Roles form a hierarchy rather than independent permission sets:
/// - `Reader`: read access to the catalog
/// - `Editor`: everything a reader may do, plus catalog mutations
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    Reader,
    Editor,
}

impl Role {
    /// Canonical upper-case name, as stored and as placed in token scopes
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Reader => "READER",
            Role::Editor => "EDITOR",
        }
    }

    /// Roles implied by holding this role, including itself
    pub fn implied_roles(&self) -> &'static [Role] {
        match self {
            Role::Reader => &[Role::Reader],
            Role::Editor => &[Role::Reader, Role::Editor],
        }
    }

    /// Expanded role set for this role
    pub fn expand(&self) -> BTreeSet<Role> {
        self.implied_roles().iter().copied().collect()
    }

    /// Parse a role name
    ///
    /// Matching is case-insensitive and tolerates the `ROLE_` authority
    /// prefix, so `"editor"`, `"EDITOR"` and `"ROLE_EDITOR"` are equivalent.
    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.trim().to_uppercase();
        let name = upper.strip_prefix("ROLE_").unwrap_or(&upper);
        match name {
            "READER" => Some(Role::Reader),
            "EDITOR" => Some(Role::Editor),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Join a role set into a space-separated scope string (`"READER EDITOR"`)
pub fn join_scope(roles: &BTreeSet<Role>) -> String {
    roles
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a scope string back into a role set
///
/// Returns `None` if any entry is not a known role.
pub fn parse_scope(scope: &str) -> Option<BTreeSet<Role>> {
    scope.split_whitespace().map(Role::parse).collect()
}

// ============================================================================
// Email normalization
// ============================================================================

/// Case-fold an email address into its lookup key
///
/// Two addresses identify the same user exactly when their normalized forms
/// are equal.
pub fn normalize_email(email: &str) -> String {
    email.to_lowercase()
}

// ============================================================================
// Tests
// ============================================================================
