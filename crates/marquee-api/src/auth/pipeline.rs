//! Per-request authentication and authorization pipeline
//!
//! ```text
//! Unauthenticated -> Authenticating -> Authorizing -> Admitted
//!        |                 |                |
//!        +--(bypass/public)+---> Rejected <-+
//! ```
//!
//! The pipeline is independent of axum: it takes the method, path and
//! headers of a request and either admits it (with the caller's identity
//! when the route needs one) or rejects it with a typed `AuthError`.
//! Protected routes accept exactly one `Authorization` header, either
//! `Basic` (verified by the authenticator) or `Bearer` (verified by the
//! token codec).

use super::authenticator::Authenticator;
use super::error::AuthError;
use super::identity::Identity;
use super::jwt::TokenCodec;
use super::policy::{authorize, PolicyTable, RoutePolicy};
use crate::audit::{audit_log, AuditContext, AuditEvent};
use axum::http::{header, HeaderMap, Method};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::sync::Arc;
use tracing::debug;

/// Pipeline states, logged at debug level as a request moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Unauthenticated,
    Authenticating,
    Authorizing,
    Admitted,
    Rejected,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineState::Unauthenticated => "unauthenticated",
            PipelineState::Authenticating => "authenticating",
            PipelineState::Authorizing => "authorizing",
            PipelineState::Admitted => "admitted",
            PipelineState::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Outcome of an admitted request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Authentication skipped entirely; same-origin framing allowed
    Bypass,
    /// Public route, no identity
    Public,
    /// Authenticated and authorized
    Admitted(Identity),
}

/// Credential presented in the `Authorization` header
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Basic { email: String, password: String },
    Bearer(String),
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::Basic { email, .. } => f
                .debug_struct("Basic")
                .field("email", email)
                .finish_non_exhaustive(),
            Credential::Bearer(_) => f.write_str("Bearer(..)"),
        }
    }
}

/// Parse the single `Authorization` header of a request
///
/// Missing, repeated, non-UTF-8 or unknown-scheme headers and undecodable
/// Basic payloads are all `Unauthenticated`.
pub fn extract_credential(headers: &HeaderMap) -> Result<Credential, AuthError> {
    let mut values = headers.get_all(header::AUTHORIZATION).iter();
    let value = values.next().ok_or(AuthError::Unauthenticated)?;
    if values.next().is_some() {
        return Err(AuthError::Unauthenticated);
    }

    let value = value.to_str().map_err(|_| AuthError::Unauthenticated)?;
    let (scheme, payload) = value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::Unauthenticated)?;
    let payload = payload.trim();

    if scheme.eq_ignore_ascii_case("bearer") && !payload.is_empty() {
        return Ok(Credential::Bearer(payload.to_string()));
    }

    if scheme.eq_ignore_ascii_case("basic") {
        let decoded = STANDARD
            .decode(payload)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or(AuthError::Unauthenticated)?;
        let (email, password) = decoded
            .split_once(':')
            .ok_or(AuthError::Unauthenticated)?;

        return Ok(Credential::Basic {
            email: email.to_string(),
            password: password.to_string(),
        });
    }

    Err(AuthError::Unauthenticated)
}

/// Admission control for every inbound request
#[derive(Clone)]
pub struct RequestPipeline {
    policies: Arc<PolicyTable>,
    codec: Arc<TokenCodec>,
    authenticator: Arc<Authenticator>,
}

impl RequestPipeline {
    pub fn new(
        policies: Arc<PolicyTable>,
        codec: Arc<TokenCodec>,
        authenticator: Arc<Authenticator>,
    ) -> Self {
        Self {
            policies,
            codec,
            authenticator,
        }
    }

    /// Admit or reject a request
    pub async fn admit(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<Admission, AuthError> {
        let resource = format!("{method} {path}");
        let resolved = self.policies.resolve(method, path);
        debug!(
            resource = %resource,
            policy = %resolved.policy,
            state = %PipelineState::Unauthenticated,
            "Request received"
        );

        if !resolved.policy.requires_identity() {
            debug!(resource = %resource, state = %PipelineState::Admitted, "No identity required");
            return Ok(match resolved.policy {
                RoutePolicy::Bypass => Admission::Bypass,
                _ => Admission::Public,
            });
        }

        debug!(resource = %resource, state = %PipelineState::Authenticating);
        let identity = match self.authenticate(headers, &resource).await {
            Ok(identity) => identity,
            Err(error) => {
                debug!(resource = %resource, state = %PipelineState::Rejected, error = %error);
                return Err(error);
            }
        };

        debug!(
            resource = %resource,
            user_id = identity.user_id,
            state = %PipelineState::Authorizing
        );
        if let Err(error) = authorize(&identity, resolved.policy, resolved.resource_owner_id) {
            let context = AuditContext::from_headers(headers);
            audit_log(&AuditEvent::AccessDenied {
                user_id: Some(identity.user_id),
                email: Some(identity.email.clone()),
                resource: resource.clone(),
                policy: resolved.policy.to_string(),
                ip_address: context.ip_address,
                user_agent: context.user_agent,
            });
            debug!(resource = %resource, state = %PipelineState::Rejected, error = %error);
            return Err(error);
        }

        debug!(resource = %resource, user_id = identity.user_id, state = %PipelineState::Admitted);
        Ok(Admission::Admitted(identity))
    }

    /// Resolve the caller's identity from the request's credential
    async fn authenticate(&self, headers: &HeaderMap, resource: &str) -> Result<Identity, AuthError> {
        let context = AuditContext::from_headers(headers);

        let credential = extract_credential(headers).map_err(|error| {
            audit_log(&AuditEvent::InvalidToken {
                resource: resource.to_string(),
                reason: "missing or unusable Authorization header".to_string(),
                ip_address: context.ip_address.clone(),
                user_agent: context.user_agent.clone(),
            });
            error
        })?;

        match credential {
            Credential::Bearer(token) => self.codec.verify(&token).map_err(|error| {
                let error = AuthError::from(error);
                audit_log(&AuditEvent::InvalidToken {
                    resource: resource.to_string(),
                    reason: error.to_string(),
                    ip_address: context.ip_address.clone(),
                    user_agent: context.user_agent.clone(),
                });
                error
            }),
            Credential::Basic { email, password } => self
                .authenticator
                .authenticate(&email, &password)
                .await
                .map_err(|error| {
                    audit_log(&AuditEvent::LoginFailure {
                        email,
                        reason: error.to_string(),
                        ip_address: context.ip_address.clone(),
                        user_agent: context.user_agent.clone(),
                    });
                    error
                }),
        }
    }
}
