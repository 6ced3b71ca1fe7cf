//! JWT token issuance and validation
//!
//! Tokens are HMAC-SHA256 signed and self-contained: subject, email and the
//! expanded role scope are all carried in the claims, so verification never
//! touches the credential store. Expiry is the only lifetime bound.

use super::identity::Identity;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use marquee_core::{
    config::MIN_SECRET_KEY_BYTES, join_scope, parse_scope, ConfigError, JwtConfig, TokenSettings,
    UserId,
};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SECRET_KEY_ENV: &str = "JWT_SECRET_KEY";

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer
    pub iss: String,
    /// Subject - user id
    pub sub: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration (Unix seconds)
    pub exp: i64,
    /// User's email address
    pub email: String,
    /// Space-separated expanded role set
    pub scope: String,
}

impl Claims {
    /// Reconstruct the identity carried by these claims
    pub fn to_identity(&self) -> Result<Identity, TokenError> {
        let user_id: UserId = self.sub.parse().map_err(|_| TokenError::MalformedToken)?;
        let granted_roles = parse_scope(&self.scope).ok_or(TokenError::MalformedToken)?;

        Ok(Identity {
            user_id,
            email: self.email.clone(),
            granted_roles,
        })
    }
}

/// Token errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Failed to encode token: {0}")]
    Encoding(String),

    #[error("Malformed token")]
    MalformedToken,

    #[error("Invalid token signature")]
    SignatureInvalid,

    #[error("Token has expired")]
    Expired,
}

/// Signs and verifies tokens with the server-held secret
///
/// Read-only after construction; share it behind an `Arc`.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    settings: TokenSettings,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Build a codec from configuration
    ///
    /// Fails when the secret is absent, not base64url, or shorter than
    /// 32 bytes once decoded.
    pub fn new(config: &JwtConfig) -> Result<Self, ConfigError> {
        let encoded = config
            .secret_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingRequired(SECRET_KEY_ENV.to_string()))?;
        let secret = decode_secret_key(encoded)?;

        Ok(Self::from_secret(&secret, config.token.clone()))
    }

    /// Build a codec from raw key bytes
    pub fn from_secret(secret: &[u8], settings: TokenSettings) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            settings,
        }
    }

    /// Issue a token for an identity, valid from now for the configured lifetime
    pub fn issue(&self, identity: &Identity) -> Result<String, TokenError> {
        self.issue_at(identity, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, identity: &Identity, now: DateTime<Utc>) -> Result<String, TokenError> {
        let iat = now.timestamp();
        let lifetime = i64::try_from(self.settings.lifetime_secs).unwrap_or(i64::MAX);

        let claims = Claims {
            iss: self.settings.issuer.clone(),
            sub: identity.user_id.to_string(),
            iat,
            exp: iat.saturating_add(lifetime),
            email: identity.email.clone(),
            scope: join_scope(&identity.granted_roles),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Decode and validate a token's claims
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode_at(token, Utc::now())
    }

    /// Decode and validate a token as if the current time were `now`
    ///
    /// The signature is checked before any claim, so a token that has both
    /// been tampered with and expired reports `SignatureInvalid`.
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against `now`, without leeway
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.set_issuer(&[&self.settings.issuer]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                _ => TokenError::MalformedToken,
            })?
            .claims;

        if now.timestamp() > claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Validate a token and reconstruct the caller's identity
    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        self.decode(token)?.to_identity()
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, TokenError> {
        self.decode_at(token, now)?.to_identity()
    }
}

/// Decode a base64url secret key, tolerating trailing padding
pub fn decode_secret_key(encoded: &str) -> Result<Vec<u8>, ConfigError> {
    let secret = URL_SAFE_NO_PAD
        .decode(encoded.trim().trim_end_matches('='))
        .map_err(|_| ConfigError::InvalidValue {
            key: SECRET_KEY_ENV.to_string(),
            value: "<not base64url>".to_string(),
        })?;

    if secret.len() < MIN_SECRET_KEY_BYTES {
        return Err(ConfigError::InvalidValue {
            key: SECRET_KEY_ENV.to_string(),
            value: format!(
                "<{} bytes, at least {MIN_SECRET_KEY_BYTES} required>",
                secret.len()
            ),
        });
    }

    Ok(secret)
}

/// Generate a fresh random secret key, base64url encoded without padding
pub fn generate_secret_key() -> String {
    let mut bytes = [0u8; MIN_SECRET_KEY_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
