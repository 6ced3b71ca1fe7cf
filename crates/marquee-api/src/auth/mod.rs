//! Authentication and authorization
//!
//! - Password hashing with scheme tags and upgrade detection (`password`)
//! - User lookup with email normalization (`resolver`)
//! - Email/password verification (`authenticator`)
//! - Signed, expiring bearer tokens (`jwt`)
//! - Route policies and the authorization evaluator (`policy`)
//! - Per-request admission (`pipeline`) and its axum middleware (`middleware`)
//! - The credential store (`repository`) and registration/profile logic (`service`)

pub mod authenticator;
pub mod error;
pub mod identity;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod pipeline;
pub mod policy;
pub mod repository;
pub mod resolver;
pub mod service;

pub use authenticator::Authenticator;
pub use error::AuthError;
pub use identity::{Caller, Identity};
pub use jwt::{generate_secret_key, Claims, TokenCodec, TokenError};
pub use middleware::auth_middleware;
pub use models::{AuthenticationRequest, AuthenticationResponse, NewUser, User, UserDto, UserRequest};
pub use password::{PasswordError, PasswordHasher, Verification};
pub use pipeline::{Admission, RequestPipeline};
pub use policy::{authorize, MethodMatcher, PolicyRule, PolicyTable, RoutePattern, RoutePolicy};
pub use repository::{
    CredentialStore, InMemoryCredentialStore, PgCredentialStore, RepositoryError,
};
pub use resolver::IdentityResolver;
pub use service::AuthService;
