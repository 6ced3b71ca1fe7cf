//! API handlers

pub mod actors;
pub mod console;
pub mod health;
pub mod movies;
pub mod sessions;
pub mod users;

use crate::error::AppError;

/// Fallback for paths no route matches
pub async fn not_found() -> AppError {
    AppError::NotFound("Resource not found".to_string())
}
