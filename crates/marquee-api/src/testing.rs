//! Test fixtures
//!
//! Builds an [`AppState`] over the in-memory credential store with a fixed
//! signing key and cheap Argon2 parameters, pre-populated with users.

use crate::auth::{CredentialStore, InMemoryCredentialStore, NewUser, PasswordHasher};
use crate::catalog::Catalog;
use crate::state::AppState;
use axum::Router;
use marquee_core::{AppConfig, PasswordConfig, Role};
use std::sync::Arc;

/// Base64url of a 36-byte key, only for tests
pub const TESTING_SECRET_KEY: &str = "bWFycXVlZS10ZXN0aW5nLXNlY3JldC1rZXktMzItYnl0ZXMh";

/// A user created before the test runs
#[derive(Debug, Clone)]
pub struct TestUser {
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl TestUser {
    pub fn new(email: &str, password: &str, role: Role) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            role,
        }
    }
}

/// Configuration used by tests: fixed key, fast hashing, console on
pub fn testing_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.jwt.secret_key = Some(TESTING_SECRET_KEY.to_string());
    config.password = PasswordConfig {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
        output_len: 32,
    };
    config.database.console_enabled = true;
    config
}

/// State over `testing_config()` with a seeded catalog
///
/// Users get ids in the order given, starting at 1.
pub async fn testing_state(users: &[TestUser]) -> anyhow::Result<Arc<AppState>> {
    testing_state_with(testing_config(), users).await
}

pub async fn testing_state_with(
    config: AppConfig,
    users: &[TestUser],
) -> anyhow::Result<Arc<AppState>> {
    let store = Arc::new(InMemoryCredentialStore::new());
    let hasher = PasswordHasher::new(&config.password)?;

    for user in users {
        let hash = hasher.hash(&user.password)?;
        store
            .create(NewUser::new(&user.email, hash).with_role(user.role))
            .await?;
    }

    let catalog = Arc::new(Catalog::new());
    catalog.seed().await;

    Ok(Arc::new(AppState::new(config, store, catalog)?))
}

/// Full router over `testing_state(users)`
pub async fn create_router_for_testing(users: &[TestUser]) -> anyhow::Result<Router> {
    Ok(crate::create_router(testing_state(users).await?))
}
