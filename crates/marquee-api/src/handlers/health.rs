//! Health check handlers

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Liveness - basic health check
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_secs(),
    })
}

/// Readiness response
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub credential_store: bool,
}

/// Readiness - checks the credential store is reachable
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let credential_store = match state.store.count().await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Credential store unreachable");
            false
        }
    };

    let response = ReadinessResponse {
        ready: credential_store,
        checks: ReadinessChecks { credential_store },
    };

    if response.ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}
