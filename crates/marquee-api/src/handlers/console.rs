//! Diagnostic console
//!
//! A small HTML page with store counts. Only routed when
//! `database.console_enabled` is set; the pipeline lets it through without
//! credentials and allows same-origin framing.

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, response::Html};
use std::sync::Arc;

pub async fn console_page(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    let users = state
        .store
        .count()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    let movies = state.catalog.list_movies().await.len();
    let actors = state.catalog.list_actors().await.len();
    let store_kind = if state.config.database.url.is_some() {
        "postgres"
    } else {
        "in-memory"
    };

    Ok(Html(format!(
        "<!DOCTYPE html>\n\
         <html><head><title>marquee console</title></head><body>\n\
         <h1>marquee console</h1>\n\
         <table>\n\
         <tr><th>credential store</th><td>{store_kind}</td></tr>\n\
         <tr><th>users</th><td>{users}</td></tr>\n\
         <tr><th>movies</th><td>{movies}</td></tr>\n\
         <tr><th>actors</th><td>{actors}</td></tr>\n\
         <tr><th>uptime (s)</th><td>{uptime}</td></tr>\n\
         </table>\n\
         </body></html>\n",
        uptime = state.uptime_secs(),
    )))
}
