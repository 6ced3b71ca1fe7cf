//! marquee API - authentication and authorization in front of a movie catalog
//!
//! Provides HTTP endpoints for user registration, login and the catalog,
//! all admitted through the request pipeline in [`auth`].

pub mod audit;
pub mod auth;
pub mod catalog;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

use crate::auth::auth_middleware;
use crate::middleware::security_headers_middleware;
use crate::state::AppState;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the application router
///
/// Layer order, outermost first: request tracing, security headers,
/// authentication. The auth layer wraps the fallback as well, so unknown
/// paths get the least-privilege policy instead of a bare 404.
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .nest("/api/v1", routes::api_routes());

    if state.config.database.console_enabled {
        router = router.route("/db-console", get(handlers::console::console_page));
    }

    router
        .fallback(handlers::not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
