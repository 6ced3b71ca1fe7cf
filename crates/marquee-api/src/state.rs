//! Application state management

use crate::auth::{
    AuthService, Authenticator, CredentialStore, PasswordHasher, PolicyTable, RequestPipeline,
    TokenCodec,
};
use crate::catalog::Catalog;
use marquee_core::AppConfig;
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    /// Credential store backing users
    pub store: Arc<dyn CredentialStore>,
    /// Protected movie/actor resource
    pub catalog: Arc<Catalog>,
    /// Token issue/verify
    pub codec: Arc<TokenCodec>,
    /// Registration, login and profile operations
    pub auth: AuthService,
    /// Per-request admission control
    pub pipeline: RequestPipeline,
}

impl AppState {
    /// Wire the auth components from configuration
    ///
    /// Fails when the signing key is missing or too short, or when the
    /// password hashing parameters are rejected.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn CredentialStore>,
        catalog: Arc<Catalog>,
    ) -> anyhow::Result<Self> {
        let codec = Arc::new(TokenCodec::new(&config.jwt)?);
        let hasher = Arc::new(PasswordHasher::new(&config.password)?);
        let authenticator = Arc::new(Authenticator::new(store.clone(), hasher.clone())?);
        let policies = Arc::new(PolicyTable::standard(config.database.console_enabled));

        let auth = AuthService::new(
            store.clone(),
            hasher,
            authenticator.clone(),
            codec.clone(),
        );
        let pipeline = RequestPipeline::new(policies, codec.clone(), authenticator);

        Ok(Self {
            config,
            start_time: Instant::now(),
            store,
            catalog,
            codec,
            auth,
            pipeline,
        })
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
