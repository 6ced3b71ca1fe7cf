//! Actor handlers
//!
//! Reads need an authenticated caller, mutations the `EDITOR` role; both are
//! enforced by the request pipeline.

use crate::catalog::{Actor, ActorId, ActorRequest};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

fn validate(request: &ActorRequest) -> Result<(), AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be blank".to_string()));
    }
    Ok(())
}

pub async fn list_actors(State(state): State<Arc<AppState>>) -> Json<Vec<Actor>> {
    Json(state.catalog.list_actors().await)
}

pub async fn get_actor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ActorId>,
) -> Result<Json<Actor>, AppError> {
    Ok(Json(state.catalog.get_actor(id).await?))
}

pub async fn create_actor(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ActorRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate(&request)?;
    let actor = state.catalog.create_actor(request).await;
    Ok((StatusCode::CREATED, Json(actor)))
}

pub async fn update_actor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ActorId>,
    Json(request): Json<ActorRequest>,
) -> Result<Json<Actor>, AppError> {
    validate(&request)?;
    Ok(Json(state.catalog.update_actor(id, request).await?))
}

/// Delete an actor, removing it from every movie cast
pub async fn delete_actor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ActorId>,
) -> Result<StatusCode, AppError> {
    state.catalog.delete_actor(id).await?;
    tracing::info!(actor_id = id, "Actor deleted");
    Ok(StatusCode::NO_CONTENT)
}
