//! marquee API Server
//!
//! REST API server for the marquee movie catalog.

use anyhow::Context;
use marquee_api::auth::{CredentialStore, InMemoryCredentialStore, PgCredentialStore};
use marquee_api::catalog::Catalog;
use marquee_api::{create_router, state::AppState};
use marquee_core::{AppConfig, LoggingConfig};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", logging.level)));

    if logging.json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    init_tracing(&config.logging);

    // Credential store
    let store: Arc<dyn CredentialStore> = match &config.database.url {
        Some(url) => {
            let store = PgCredentialStore::connect(url, config.database.pool_size)
                .await
                .context("Failed to connect to PostgreSQL")?;
            store
                .ensure_schema()
                .await
                .context("Failed to create users table")?;
            tracing::info!("Using PostgreSQL credential store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, users are kept in memory only");
            Arc::new(InMemoryCredentialStore::new())
        }
    };

    // Catalog
    let catalog = Arc::new(Catalog::new());
    if config.database.seed_demo_data {
        catalog.seed().await;
    }

    let addr = config.server.bind_address();
    let console_enabled = config.database.console_enabled;

    // Create application state
    let state = Arc::new(AppState::new(config, store, catalog)?);

    // Create router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("marquee API server starting on http://{}", addr);
    if console_enabled {
        tracing::warn!("Diagnostic console enabled at http://{}/db-console", addr);
    }

    axum::serve(listener, app).await?;

    Ok(())
}
