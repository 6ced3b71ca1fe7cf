//! Marquee Configuration Management
//!
//! Handles configuration from an optional TOML file and environment
//! variables, with defaults suitable for local development. The token
//! signing key is the one value with no default.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming the TOML config file
pub const CONFIG_PATH_ENV: &str = "MARQUEE_CONFIG";

/// Minimum decoded length of the token signing key (HMAC-SHA256 block strength)
pub const MIN_SECRET_KEY_BYTES: usize = 32;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Token signing and lifetime
    pub jwt: JwtConfig,

    /// Password hashing parameters
    pub password: PasswordConfig,

    /// Credential store and diagnostics
    pub database: DatabaseConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration the way the binaries do
    ///
    /// Defaults, then the file named by `MARQUEE_CONFIG` if set, then
    /// environment variables on top.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?.with_env_override(),
            Err(_) => Self::from_env(),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_override()
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        Self::from_toml_str(&content).map_err(|message| ConfigError::ParseError { path, message })
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Apply environment variables on top of this configuration (env wins)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        // Server
        if let Ok(host) = std::env::var("API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = parse_env("API_PORT")? {
            self.server.port = port;
        }

        // Tokens
        if let Ok(key) = std::env::var("JWT_SECRET_KEY") {
            self.jwt.secret_key = Some(key);
        }
        if let Ok(issuer) = std::env::var("JWT_TOKEN_ISSUER") {
            self.jwt.token.issuer = issuer;
        }
        if let Some(lifetime) = parse_env("JWT_TOKEN_LIFETIME_SECS")? {
            self.jwt.token.lifetime_secs = lifetime;
        }

        // Password hashing
        if let Some(memory) = parse_env("PASSWORD_MEMORY_COST")? {
            self.password.memory_cost = memory;
        }
        if let Some(time) = parse_env("PASSWORD_TIME_COST")? {
            self.password.time_cost = time;
        }
        if let Some(parallelism) = parse_env("PASSWORD_PARALLELISM")? {
            self.password.parallelism = parallelism;
        }

        // Database
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Some(size) = parse_env("DATABASE_POOL_SIZE")? {
            self.database.pool_size = size;
        }
        if let Some(enabled) = parse_env("DB_CONSOLE_ENABLED")? {
            self.database.console_enabled = enabled;
        }
        if let Some(seed) = parse_env("SEED_DEMO_DATA")? {
            self.database.seed_demo_data = seed;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = parse_env("LOG_JSON")? {
            self.logging.json_format = json;
        }

        Ok(self)
    }
}

/// Read and parse an optional environment variable
fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// `host:port` bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Token configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct JwtConfig {
    /// Base64url-encoded HMAC key (at least 32 bytes once decoded)
    ///
    /// Deliberately has no default; set it through `JWT_SECRET_KEY` or the
    /// config file. Rotating it invalidates every outstanding token.
    pub secret_key: Option<String>,

    /// Claims settings
    pub token: TokenSettings,
}

/// Issuer and lifetime of issued tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenSettings {
    /// `iss` claim
    pub issuer: String,

    /// Seconds between `iat` and `exp`
    pub lifetime_secs: u64,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            issuer: "self".to_string(),
            lifetime_secs: 30 * 60,
        }
    }
}

/// Password hashing configuration
///
/// Argon2id parameters. Stored hashes produced with different parameters
/// are re-hashed on the owner's next successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordConfig {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub memory_cost: u32,
    /// Time cost (iterations, default: 3)
    pub time_cost: u32,
    /// Parallelism (lanes, default: 4)
    pub parallelism: u32,
    /// Output length in bytes (default: 32)
    pub output_len: usize,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_cost: 65536,
            time_cost: 3,
            parallelism: 4,
            output_len: 32,
        }
    }
}

/// Credential store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL URL; the in-memory store is used when absent
    pub url: Option<String>,

    /// PostgreSQL connection pool size
    pub pool_size: u32,

    /// Serve the diagnostic console at `/db-console`
    pub console_enabled: bool,

    /// Load demo movies and actors at startup
    pub seed_demo_data: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            pool_size: 5,
            console_enabled: false,
            seed_demo_data: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.jwt.token.issuer, "self");
        assert_eq!(config.jwt.token.lifetime_secs, 1800);
        assert!(config.jwt.secret_key.is_none());
        assert!(config.database.url.is_none());
        assert!(!config.database.console_enabled);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [jwt]
            secret_key = "abc"

            [jwt.token]
            lifetime_secs = 60

            [database]
            console_enabled = true
            "#,
        )
        .unwrap();

        assert_eq!(config.jwt.secret_key.as_deref(), Some("abc"));
        assert_eq!(config.jwt.token.lifetime_secs, 60);
        assert_eq!(config.jwt.token.issuer, "self");
        assert!(config.database.console_enabled);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.password, PasswordConfig::default());
    }

    #[test]
    fn test_invalid_toml() {
        assert!(AppConfig::from_toml_str("[server\nport = ").is_err());
    }

    #[test]
    fn test_bind_address() {
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
        };
        assert_eq!(server.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_missing_file() {
        let result = AppConfig::from_file("/nonexistent/marquee.toml");
        assert!(matches!(result, Err(ConfigError::FileReadError { .. })));
    }
}
