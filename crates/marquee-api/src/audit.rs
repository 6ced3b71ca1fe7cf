//! Security audit logging for authentication events
//!
//! Every audit event is logged at INFO level under the `audit` target so it
//! can be filtered and routed apart from application logs. Events carry the
//! client IP and user agent when the request provides them, and never carry
//! passwords, hashes or tokens.
//!
//! ```ignore
//! use marquee_api::audit::{audit_log, AuditEvent};
//!
//! audit_log(&AuditEvent::LoginSuccess {
//!     user_id: 1,
//!     email: "jos@example.com".to_string(),
//!     ip_address: Some("192.168.1.1".to_string()),
//!     user_agent: None,
//! });
//! ```

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use marquee_core::UserId;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Security audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Successful login
    LoginSuccess {
        user_id: UserId,
        email: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Failed login attempt
    LoginFailure {
        email: String,
        reason: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Successful user registration
    RegistrationSuccess {
        user_id: UserId,
        email: String,
        role: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Failed registration attempt
    RegistrationFailure {
        email: String,
        reason: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Stored hash replaced by one using the current scheme and parameters
    PasswordRehashed { user_id: UserId, email: String },

    /// Owner changed their email and/or password
    ProfileUpdate {
        user_id: UserId,
        email: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Authenticated caller not permitted by the route policy
    AccessDenied {
        user_id: Option<UserId>,
        email: Option<String>,
        resource: String,
        policy: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Missing, malformed, forged or expired credential on a protected route
    InvalidToken {
        resource: String,
        reason: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },
}

impl AuditEvent {
    /// Short human-readable description used as the log message
    pub fn description(&self) -> &'static str {
        match self {
            AuditEvent::LoginSuccess { .. } => "Login successful",
            AuditEvent::LoginFailure { .. } => "Login failed",
            AuditEvent::RegistrationSuccess { .. } => "Registration successful",
            AuditEvent::RegistrationFailure { .. } => "Registration failed",
            AuditEvent::PasswordRehashed { .. } => "Password hash upgraded",
            AuditEvent::ProfileUpdate { .. } => "Profile updated",
            AuditEvent::AccessDenied { .. } => "Access denied",
            AuditEvent::InvalidToken { .. } => "Invalid credential",
        }
    }
}

/// Client information attached to audit events
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl AuditContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ip_address: extract_ip_address(headers),
            user_agent: extract_user_agent(headers),
        }
    }
}

/// Log a security audit event with structured fields
pub fn audit_log(event: &AuditEvent) {
    let timestamp: DateTime<Utc> = Utc::now();

    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    match event {
        AuditEvent::LoginSuccess {
            user_id,
            email,
            ip_address,
            ..
        }
        | AuditEvent::ProfileUpdate {
            user_id,
            email,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                email = %email,
                ip_address = ?ip_address,
                "{}", event.description()
            );
        }
        AuditEvent::LoginFailure {
            email,
            reason,
            ip_address,
            ..
        }
        | AuditEvent::RegistrationFailure {
            email,
            reason,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                email = %email,
                reason = %reason,
                ip_address = ?ip_address,
                "{}", event.description()
            );
        }
        AuditEvent::RegistrationSuccess {
            user_id,
            email,
            role,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                email = %email,
                role = %role,
                ip_address = ?ip_address,
                "{}", event.description()
            );
        }
        AuditEvent::PasswordRehashed { user_id, email } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                email = %email,
                "{}", event.description()
            );
        }
        AuditEvent::AccessDenied {
            user_id,
            resource,
            policy,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = ?user_id,
                resource = %resource,
                policy = %policy,
                ip_address = ?ip_address,
                "{}", event.description()
            );
        }
        AuditEvent::InvalidToken {
            resource,
            reason,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                resource = %resource,
                reason = %reason,
                ip_address = ?ip_address,
                "{}", event.description()
            );
        }
    }
}

/// Extract the client IP from proxy headers
///
/// Takes the first hop of `X-Forwarded-For`, else `X-Real-IP`.
pub fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    if let Some(first_ip) = headers
        .get("x-forwarded-for")
        .and_then(|xff| xff.to_str().ok())
        .and_then(|xff| xff.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return Some(first_ip.to_string());
    }

    headers
        .get("x-real-ip")
        .and_then(|ip| ip.to_str().ok())
        .map(|ip| ip.trim().to_string())
}

/// Extract the user agent
pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .map(|s| s.to_string())
}
