//! Request-scoped identity
//!
//! An `Identity` is an immutable snapshot taken when a caller authenticates,
//! either by password or by token. It holds no reference back to the stored
//! user, so a later role change only takes effect with the next token.

use super::models::User;
use marquee_core::{Role, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub email: String,
    /// Expanded role set (`EDITOR` yields `{READER, EDITOR}`)
    pub granted_roles: BTreeSet<Role>,
}

impl Identity {
    /// Build an identity for a role, expanding the hierarchy
    pub fn new(user_id: UserId, email: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            email: email.into(),
            granted_roles: role.expand(),
        }
    }

    pub fn from_user(user: &User) -> Self {
        Self::new(user.id, user.email.clone(), user.role)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.granted_roles.contains(&role)
    }
}

/// Who is making the current request
///
/// Inserted into request extensions by the auth middleware for every admitted
/// request; public routes see `Anonymous`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    Authenticated(Identity),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_expands_roles() {
        let editor = Identity::new(1, "ed@example.com", Role::Editor);
        assert!(editor.has_role(Role::Reader));
        assert!(editor.has_role(Role::Editor));

        let reader = Identity::new(2, "re@example.com", Role::Reader);
        assert!(reader.has_role(Role::Reader));
        assert!(!reader.has_role(Role::Editor));
    }

    #[test]
    fn test_identity_from_user_is_a_snapshot() {
        let mut user = User {
            id: 3,
            email: "jos@example.com".to_string(),
            password_hash: "{noop}x".to_string(),
            role: Role::Reader,
        };
        let identity = Identity::from_user(&user);

        user.role = Role::Editor;
        assert!(!identity.has_role(Role::Editor));
        assert_eq!(identity.user_id, 3);
        assert_eq!(identity.email, "jos@example.com");
    }
}
