//! User registration and profile handlers
//!
//! Ownership of `/users/{id}` is enforced by the request pipeline before
//! these handlers run.

use crate::audit::AuditContext;
use crate::auth::{UserDto, UserRequest};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use marquee_core::UserId;
use std::sync::Arc;

/// Register a new user account
///
/// New users get the `READER` role. Emails are compared case-insensitively,
/// so a case variant of a registered email is a conflict.
///
/// # Responses
///
/// * `201 Created` - the new user
/// * `400 Bad Request` - blank email or password
/// * `409 Conflict` - email already registered
pub async fn register(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<UserRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate().map_err(AppError::BadRequest)?;

    let context = AuditContext::from_headers(&headers);
    let user = state.auth.register(&request, &context).await?;

    Ok((StatusCode::CREATED, Json(UserDto::from(user))))
}

/// Read the caller's own profile
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
) -> Result<Json<UserDto>, AppError> {
    let user = state.auth.get_user(id).await?;
    Ok(Json(UserDto::from(user)))
}

/// Replace the caller's email and password
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
    headers: HeaderMap,
    Json(request): Json<UserRequest>,
) -> Result<Json<UserDto>, AppError> {
    request.validate().map_err(AppError::BadRequest)?;

    let context = AuditContext::from_headers(&headers);
    let user = state.auth.update_user(id, &request, &context).await?;

    Ok(Json(UserDto::from(user)))
}
