//! Email + password authentication
//!
//! Unknown emails and wrong passwords fail with the same `InvalidCredentials`
//! kind, and the unknown-email path still runs one hash verification so the
//! two cases take comparable time. A successful login against an outdated
//! hash re-hashes the password and swaps it in, but only if the stored hash
//! is still the one that was verified.

use super::error::AuthError;
use super::identity::Identity;
use super::password::{PasswordError, PasswordHasher};
use super::repository::CredentialStore;
use super::resolver::IdentityResolver;
use crate::audit::{audit_log, AuditEvent};
use std::sync::Arc;

/// Plaintext hashed once at startup to produce the timing-equalization hash
const DUMMY_PASSWORD: &str = "marquee-unknown-user-placeholder";

pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    resolver: IdentityResolver,
    hasher: Arc<PasswordHasher>,
    dummy_hash: String,
}

impl Authenticator {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<PasswordHasher>,
    ) -> Result<Self, PasswordError> {
        let dummy_hash = hasher.hash(DUMMY_PASSWORD)?;

        Ok(Self {
            resolver: IdentityResolver::new(Arc::clone(&store)),
            store,
            hasher,
            dummy_hash,
        })
    }

    /// Verify an email/password pair and snapshot the user's identity
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let Some(user) = self.resolver.find_by_email(email).await? else {
            // Result ignored; only the elapsed time matters here
            let _ = self.hasher.verify(password, &self.dummy_hash);
            tracing::debug!("Authentication failed: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let verification = self.hasher.verify(password, &user.password_hash)?;
        if !verification.matches {
            tracing::debug!(user_id = user.id, "Authentication failed: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let identity = Identity::from_user(&user);
        if verification.outdated {
            self.upgrade_hash(&identity, &user.password_hash, password)
                .await?;
        }

        Ok(identity)
    }

    async fn upgrade_hash(
        &self,
        identity: &Identity,
        verified_hash: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        let new_hash = self.hasher.hash(password)?;
        let swapped = self
            .store
            .update_password_hash(identity.user_id, verified_hash, &new_hash)
            .await?;

        if !swapped {
            tracing::debug!(
                user_id = identity.user_id,
                "Password changed during login, hash upgrade skipped"
            );
            return Ok(());
        }

        audit_log(&AuditEvent::PasswordRehashed {
            user_id: identity.user_id,
            email: identity.email.clone(),
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::{NewUser, User};
    use crate::auth::repository::{InMemoryCredentialStore, RepositoryError};
    use async_trait::async_trait;
    use marquee_core::{PasswordConfig, Role, UserId};

    fn fast_hasher() -> Arc<PasswordHasher> {
        Arc::new(
            PasswordHasher::new(&PasswordConfig {
                memory_cost: 1024,
                time_cost: 1,
                parallelism: 1,
                output_len: 32,
            })
            .unwrap(),
        )
    }

    async fn setup(users: &[(&str, &str, Role)]) -> (Arc<InMemoryCredentialStore>, Authenticator) {
        let store = Arc::new(InMemoryCredentialStore::new());
        for (email, hash, role) in users {
            store
                .create(NewUser::new(email, *hash).with_role(*role))
                .await
                .unwrap();
        }
        let authenticator = Authenticator::new(store.clone(), fast_hasher()).unwrap();
        (store, authenticator)
    }

    #[tokio::test]
    async fn test_authenticate_with_current_hash() {
        let hash = fast_hasher().hash("secret1").unwrap();
        let (store, authenticator) = setup(&[("jos@example.com", hash.as_str(), Role::Reader)]).await;

        let identity = authenticator
            .authenticate("JOS@EXAMPLE.COM", "secret1")
            .await
            .unwrap();

        assert_eq!(identity.user_id, 1);
        assert_eq!(identity.email, "jos@example.com");
        assert_eq!(identity.granted_roles, Role::Reader.expand());

        // Current hashes are left alone
        let stored = store.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, hash);
    }

    #[tokio::test]
    async fn test_legacy_hash_is_upgraded_on_login() {
        let (store, authenticator) =
            setup(&[("ed@example.com", "{noop}password", Role::Editor)]).await;

        let identity = authenticator
            .authenticate("ed@example.com", "password")
            .await
            .unwrap();
        assert!(identity.has_role(Role::Editor));

        let stored = store.find_by_id(1).await.unwrap().unwrap();
        assert!(stored.password_hash.starts_with("{argon2}"));
        assert_eq!(stored.role, Role::Editor);

        // Still logs in after the upgrade
        assert!(authenticator
            .authenticate("ed@example.com", "password")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_are_indistinguishable() {
        let (store, authenticator) =
            setup(&[("jos@example.com", "{noop}secret1", Role::Reader)]).await;

        let wrong_password = authenticator
            .authenticate("jos@example.com", "wrong")
            .await
            .unwrap_err();
        let unknown_email = authenticator
            .authenticate("nobody@example.com", "secret1")
            .await
            .unwrap_err();

        assert_eq!(wrong_password, AuthError::InvalidCredentials);
        assert_eq!(wrong_password, unknown_email);
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());

        // A failed login never upgrades the hash
        let stored = store.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "{noop}secret1");
    }

    #[tokio::test]
    async fn test_corrupt_stored_hash() {
        let (_, authenticator) = setup(&[("bad@example.com", "garbage", Role::Reader)]).await;

        let result = authenticator.authenticate("bad@example.com", "x").await;
        assert_eq!(result, Err(AuthError::CorruptCredential));
    }

    /// Store that changes the user's password right after the login lookup
    struct PasswordChangedMidLogin {
        inner: InMemoryCredentialStore,
        new_hash: String,
    }

    #[async_trait]
    impl CredentialStore for PasswordChangedMidLogin {
        async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
            self.inner.create(user).await
        }

        async fn update(&self, user: &User) -> Result<User, RepositoryError> {
            self.inner.update(user).await
        }

        async fn update_password_hash(
            &self,
            id: UserId,
            expected_hash: &str,
            new_hash: &str,
        ) -> Result<bool, RepositoryError> {
            self.inner
                .update_password_hash(id, expected_hash, new_hash)
                .await
        }

        async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
            self.inner.find_by_id(id).await
        }

        async fn find_by_normalized_email(
            &self,
            email: &str,
        ) -> Result<Option<User>, RepositoryError> {
            let found = self.inner.find_by_normalized_email(email).await?;
            if let Some(user) = &found {
                self.inner
                    .update(&User {
                        password_hash: self.new_hash.clone(),
                        ..user.clone()
                    })
                    .await?;
            }
            Ok(found)
        }

        async fn count(&self) -> Result<u64, RepositoryError> {
            self.inner.count().await
        }
    }

    #[tokio::test]
    async fn test_upgrade_never_overwrites_concurrent_password_change() {
        let hasher = fast_hasher();
        let store = Arc::new(PasswordChangedMidLogin {
            inner: InMemoryCredentialStore::new(),
            new_hash: hasher.hash("new-password").unwrap(),
        });
        store
            .create(NewUser::new("a@example.com", "{noop}old-password"))
            .await
            .unwrap();
        let authenticator = Authenticator::new(store.clone(), hasher.clone()).unwrap();

        // The old password was valid when it was checked
        authenticator
            .authenticate("a@example.com", "old-password")
            .await
            .unwrap();

        let stored = store.inner.find_by_id(1).await.unwrap().unwrap();
        assert!(hasher.verify("new-password", &stored.password_hash).unwrap().matches);
        assert!(!hasher.verify("old-password", &stored.password_hash).unwrap().matches);
    }
}
