//! Movie handlers

use crate::catalog::{Movie, MovieId, MovieRequest};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

fn validate(request: &MovieRequest) -> Result<(), AppError> {
    if request.title.trim().is_empty() {
        return Err(AppError::BadRequest("title must not be blank".to_string()));
    }
    if request.director.trim().is_empty() {
        return Err(AppError::BadRequest("director must not be blank".to_string()));
    }
    Ok(())
}

pub async fn list_movies(State(state): State<Arc<AppState>>) -> Json<Vec<Movie>> {
    Json(state.catalog.list_movies().await)
}

pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<MovieId>,
) -> Result<Json<Movie>, AppError> {
    Ok(Json(state.catalog.get_movie(id).await?))
}

/// Create a movie; `actorIds` must reference existing actors
pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MovieRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate(&request)?;
    let movie = state.catalog.create_movie(request).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

pub async fn update_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<MovieId>,
    Json(request): Json<MovieRequest>,
) -> Result<Json<Movie>, AppError> {
    validate(&request)?;
    Ok(Json(state.catalog.update_movie(id, request).await?))
}

pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<MovieId>,
) -> Result<StatusCode, AppError> {
    state.catalog.delete_movie(id).await?;
    tracing::info!(movie_id = id, "Movie deleted");
    Ok(StatusCode::NO_CONTENT)
}
