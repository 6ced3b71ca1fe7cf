//! API route definitions
//!
//! Routes carry no per-route auth layers: every request, routed or not,
//! passes the request pipeline installed in `create_router`, which resolves
//! its policy from the policy table.

use crate::handlers::{actors, movies, sessions, users};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Create API v1 routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Users
        .route("/users", post(users::register))
        .route("/users/:id", get(users::get_user).put(users::update_user))
        // Sessions
        .route("/sessions", post(sessions::login))
        // Movies
        .route("/movies", get(movies::list_movies).post(movies::create_movie))
        .route(
            "/movies/:id",
            get(movies::get_movie)
                .put(movies::update_movie)
                .delete(movies::delete_movie),
        )
        // Actors
        .route("/actors", get(actors::list_actors).post(actors::create_actor))
        .route(
            "/actors/:id",
            get(actors::get_actor)
                .put(actors::update_actor)
                .delete(actors::delete_actor),
        )
}
