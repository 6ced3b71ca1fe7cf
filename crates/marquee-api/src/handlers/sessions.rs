//! Login handler
//!
//! Credentials come from the JSON body or, when the body is empty, from an
//! `Authorization: Basic` header.

use crate::audit::AuditContext;
use crate::auth::pipeline::{extract_credential, Credential};
use crate::auth::{AuthError, AuthenticationRequest, AuthenticationResponse};
use crate::error::AppError;
use crate::state::AppState;
use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use std::sync::Arc;

/// Exchange email and password for a bearer token
///
/// # Responses
///
/// * `200 OK` - `{ "token": ... }`
/// * `400 Bad Request` - unparseable or blank body
/// * `401 Unauthorized` - wrong email or password, indistinguishably
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AuthenticationResponse>, AppError> {
    let (email, password) = if body.is_empty() {
        match extract_credential(&headers)? {
            Credential::Basic { email, password } => (email, password),
            Credential::Bearer(_) => return Err(AuthError::Unauthenticated.into()),
        }
    } else {
        let request: AuthenticationRequest = serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid login body: {e}")))?;
        request.validate().map_err(AppError::BadRequest)?;
        (request.email_address, request.password)
    };

    let context = AuditContext::from_headers(&headers);
    let response = state.auth.login(&email, &password, &context).await?;

    Ok(Json(response))
}
