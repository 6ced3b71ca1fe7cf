//! Identity resolution: user lookup with email normalization

use super::error::AuthError;
use super::models::User;
use super::repository::CredentialStore;
use marquee_core::{normalize_email, UserId};
use std::sync::Arc;

/// Read-only user lookup over the credential store
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn CredentialStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Find a user by email in any casing
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        Ok(self
            .store
            .find_by_normalized_email(&normalize_email(email))
            .await?)
    }

    /// Find a user by id, failing with `UserNotFound`
    pub async fn find_by_id(&self, id: UserId) -> Result<User, AuthError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(AuthError::UserNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::NewUser;
    use crate::auth::repository::InMemoryCredentialStore;

    #[tokio::test]
    async fn test_find_by_email_ignores_case() {
        let store = Arc::new(InMemoryCredentialStore::new());
        let created = store
            .create(NewUser::new("jos@example.com", "{noop}secret1"))
            .await
            .unwrap();
        let resolver = IdentityResolver::new(store);

        for email in ["jos@example.com", "JOS@EXAMPLE.COM", "Jos@Example.com"] {
            assert_eq!(
                resolver.find_by_email(email).await.unwrap(),
                Some(created.clone())
            );
        }
        assert_eq!(resolver.find_by_email("x@example.com").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_by_id_not_found() {
        let resolver = IdentityResolver::new(Arc::new(InMemoryCredentialStore::new()));
        assert_eq!(
            resolver.find_by_id(5).await,
            Err(AuthError::UserNotFound(5))
        );
    }
}
