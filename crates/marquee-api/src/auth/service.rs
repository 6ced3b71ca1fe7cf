//! Authentication service layer
//!
//! Business logic behind the user and session endpoints: registration,
//! login (token issuance) and owner profile read/update. Storage-level
//! uniqueness violations surface here as `AuthError::DuplicateEmail`.

use super::authenticator::Authenticator;
use super::error::AuthError;
use super::jwt::TokenCodec;
use super::models::{AuthenticationResponse, NewUser, User, UserRequest};
use super::password::PasswordHasher;
use super::repository::CredentialStore;
use super::resolver::IdentityResolver;
use crate::audit::{audit_log, AuditContext, AuditEvent};
use marquee_core::{normalize_email, UserId};
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    resolver: IdentityResolver,
    hasher: Arc<PasswordHasher>,
    authenticator: Arc<Authenticator>,
    codec: Arc<TokenCodec>,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<PasswordHasher>,
        authenticator: Arc<Authenticator>,
        codec: Arc<TokenCodec>,
    ) -> Self {
        Self {
            resolver: IdentityResolver::new(Arc::clone(&store)),
            store,
            hasher,
            authenticator,
            codec,
        }
    }

    /// Register a new user with the default role
    pub async fn register(
        &self,
        request: &UserRequest,
        context: &AuditContext,
    ) -> Result<User, AuthError> {
        let password_hash = self.hasher.hash(&request.password)?;
        let new_user = NewUser::new(&request.email_address, password_hash);
        let email = new_user.email.clone();

        match self.store.create(new_user).await {
            Ok(user) => {
                audit_log(&AuditEvent::RegistrationSuccess {
                    user_id: user.id,
                    email: user.email.clone(),
                    role: user.role.to_string(),
                    ip_address: context.ip_address.clone(),
                    user_agent: context.user_agent.clone(),
                });
                tracing::info!(user_id = user.id, "User registered");
                Ok(user)
            }
            Err(e) => {
                let error = AuthError::from(e);
                audit_log(&AuditEvent::RegistrationFailure {
                    email,
                    reason: error.to_string(),
                    ip_address: context.ip_address.clone(),
                    user_agent: context.user_agent.clone(),
                });
                Err(error)
            }
        }
    }

    /// Verify credentials and issue a bearer token
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        context: &AuditContext,
    ) -> Result<AuthenticationResponse, AuthError> {
        let identity = match self.authenticator.authenticate(email, password).await {
            Ok(identity) => identity,
            Err(error) => {
                audit_log(&AuditEvent::LoginFailure {
                    email: normalize_email(email),
                    reason: error.to_string(),
                    ip_address: context.ip_address.clone(),
                    user_agent: context.user_agent.clone(),
                });
                return Err(error);
            }
        };

        let token = self.codec.issue(&identity)?;

        audit_log(&AuditEvent::LoginSuccess {
            user_id: identity.user_id,
            email: identity.email,
            ip_address: context.ip_address.clone(),
            user_agent: context.user_agent.clone(),
        });

        Ok(AuthenticationResponse { token })
    }

    pub async fn get_user(&self, id: UserId) -> Result<User, AuthError> {
        self.resolver.find_by_id(id).await
    }

    /// Replace a user's email and password; the role is unchanged
    pub async fn update_user(
        &self,
        id: UserId,
        request: &UserRequest,
        context: &AuditContext,
    ) -> Result<User, AuthError> {
        let user = self.resolver.find_by_id(id).await?;
        let password_hash = self.hasher.hash(&request.password)?;

        let updated = self
            .store
            .update(&User {
                email: normalize_email(&request.email_address),
                password_hash,
                ..user
            })
            .await?;

        audit_log(&AuditEvent::ProfileUpdate {
            user_id: updated.id,
            email: updated.email.clone(),
            ip_address: context.ip_address.clone(),
            user_agent: context.user_agent.clone(),
        });

        Ok(updated)
    }
}
