//! Credential store
//!
//! The auth core only needs three things from storage: find a user by id,
//! find a user by normalized email, and persist a user with the email
//! uniqueness constraint enforced atomically by the store itself.
//!
//! Two implementations are provided:
//! - `InMemoryCredentialStore` for tests and single-process deployments
//! - `PgCredentialStore` on PostgreSQL, relying on a `UNIQUE` constraint

use super::models::{NewUser, User};
use async_trait::async_trait;
use marquee_core::{normalize_email, Role, UserId};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tokio::sync::RwLock;

/// Repository errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Email already exists: {0}")]
    DuplicateEmail(String),

    #[error("User not found: {0}")]
    NotFound(UserId),

    #[error("Database error: {0}")]
    Database(String),
}

/// Persistent storage of `User` records
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persist a new user and assign its id
    ///
    /// Fails with `DuplicateEmail` when another user already has the same
    /// normalized email. Check and insert are a single atomic step.
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Replace email, hash and role of an existing user
    async fn update(&self, user: &User) -> Result<User, RepositoryError>;

    /// Swap the password hash only if it still equals `expected_hash`
    ///
    /// Returns `false` without writing when the user is gone or the hash has
    /// changed since it was read.
    async fn update_password_hash(
        &self,
        id: UserId,
        expected_hash: &str,
        new_hash: &str,
    ) -> Result<bool, RepositoryError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Look up by an already normalized email
    async fn find_by_normalized_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    async fn count(&self) -> Result<u64, RepositoryError>;
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    by_email: HashMap<String, UserId>,
    last_id: UserId,
}

/// Credential store held in process memory
///
/// Ids are sequential starting at 1. A single write lock covers the
/// uniqueness check and the insert.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    tables: RwLock<Tables>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let email = normalize_email(&user.email);
        let mut tables = self.tables.write().await;

        if tables.by_email.contains_key(&email) {
            return Err(RepositoryError::DuplicateEmail(email));
        }

        tables.last_id += 1;
        let user = User {
            id: tables.last_id,
            email: email.clone(),
            password_hash: user.password_hash,
            role: user.role,
        };

        tables.by_email.insert(email, user.id);
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, RepositoryError> {
        let email = normalize_email(&user.email);
        let mut tables = self.tables.write().await;

        let previous_email = tables
            .users
            .get(&user.id)
            .map(|existing| existing.email.clone())
            .ok_or(RepositoryError::NotFound(user.id))?;

        if let Some(&owner) = tables.by_email.get(&email) {
            if owner != user.id {
                return Err(RepositoryError::DuplicateEmail(email));
            }
        }

        let updated = User {
            email: email.clone(),
            ..user.clone()
        };

        tables.by_email.remove(&previous_email);
        tables.by_email.insert(email, user.id);
        tables.users.insert(user.id, updated.clone());

        Ok(updated)
    }

    async fn update_password_hash(
        &self,
        id: UserId,
        expected_hash: &str,
        new_hash: &str,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(&id) {
            Some(user) if user.password_hash == expected_hash => {
                user.password_hash = new_hash.to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_normalized_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_email
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.tables.read().await.users.len() as u64)
    }
}

// ============================================================================
// PostgreSQL store
// ============================================================================

const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        email_address TEXT NOT NULL UNIQUE,
        hashed_password TEXT NOT NULL,
        role TEXT NOT NULL
    )
"#;

/// Row of the `users` table
#[derive(Debug, sqlx::FromRow)]
struct UserRecord {
    id: i64,
    email_address: String,
    hashed_password: String,
    role: String,
}

impl TryFrom<UserRecord> for User {
    type Error = RepositoryError;

    fn try_from(record: UserRecord) -> Result<Self, Self::Error> {
        let role = Role::parse(&record.role).ok_or_else(|| {
            RepositoryError::Database(format!(
                "unknown role '{}' for user {}",
                record.role, record.id
            ))
        })?;

        Ok(User {
            id: record.id,
            email: record.email_address,
            password_hash: record.hashed_password,
            role,
        })
    }
}

/// Credential store on PostgreSQL
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with a pool of at most `pool_size` connections
    pub async fn connect(url: &str, pool_size: u32) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(pool_size)
            .connect(url)
            .await
            .map_err(map_sqlx_error)?;

        Ok(Self::new(pool))
    }

    /// Create the `users` table if it does not exist
    pub async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        sqlx::query(CREATE_USERS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

/// Translate a sqlx error, turning unique violations into `DuplicateEmail`
fn map_unique_violation(err: sqlx::Error, email: &str) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            RepositoryError::DuplicateEmail(email.to_string())
        }
        _ => map_sqlx_error(err),
    }
}

fn map_sqlx_error(err: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(err.to_string())
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let email = normalize_email(&user.email);

        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (email_address, hashed_password, role) VALUES ($1, $2, $3) \
             RETURNING id, email_address, hashed_password, role",
        )
        .bind(&email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &email))?;

        record.try_into()
    }

    async fn update(&self, user: &User) -> Result<User, RepositoryError> {
        let email = normalize_email(&user.email);

        let record = sqlx::query_as::<_, UserRecord>(
            "UPDATE users SET email_address = $2, hashed_password = $3, role = $4 WHERE id = $1 \
             RETURNING id, email_address, hashed_password, role",
        )
        .bind(user.id)
        .bind(&email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &email))?;

        record
            .ok_or(RepositoryError::NotFound(user.id))?
            .try_into()
    }

    async fn update_password_hash(
        &self,
        id: UserId,
        expected_hash: &str,
        new_hash: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET hashed_password = $3 WHERE id = $1 AND hashed_password = $2",
        )
        .bind(id)
        .bind(expected_hash)
        .bind(new_hash)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, UserRecord>(
            "SELECT id, email_address, hashed_password, role FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .map(User::try_from)
        .transpose()
    }

    async fn find_by_normalized_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, UserRecord>(
            "SELECT id, email_address, hashed_password, role FROM users WHERE email_address = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .map(User::try_from)
        .transpose()
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(count.max(0) as u64)
    }
}
