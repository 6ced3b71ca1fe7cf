/// Password hashing and verification with scheme-tagged hashes
///
/// Stored hashes carry their scheme as a `{id}` prefix so several schemes can
/// coexist while users migrate:
/// - `{argon2}$argon2id$v=19$m=...`: current scheme (Argon2id, PHC string)
/// - `{noop}plaintext`: legacy plaintext used by bootstrap fixtures; it
///   verifies, is always reported outdated, and is never produced by `hash`
///
/// Verifying an Argon2 hash whose parameters differ from the configured ones
/// also reports it outdated, so raising the cost upgrades users on login.
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use marquee_core::PasswordConfig;
use thiserror::Error;

/// Scheme id of newly produced hashes
pub const CURRENT_SCHEME: &str = "argon2";

/// Scheme id of the legacy plaintext encoding
pub const LEGACY_PLAINTEXT_SCHEME: &str = "noop";

/// Password hashing and verification errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    #[error("Failed to verify password: {0}")]
    VerificationFailed(String),

    #[error("Stored credential is corrupt: {0}")]
    CorruptCredential(String),
}

/// Outcome of checking a plaintext against a stored hash
///
/// A mismatch is not an error; it is `matches == false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verification {
    pub matches: bool,
    /// The stored hash should be replaced with one from [`PasswordHasher::hash`]
    pub outdated: bool,
}

/// Scheme-aware password hasher
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// Create a hasher producing Argon2id hashes with the given parameters
    pub fn new(config: &PasswordConfig) -> Result<Self, PasswordError> {
        let params = Params::new(
            config.memory_cost,
            config.time_cost,
            config.parallelism,
            Some(config.output_len),
        )
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext password with the current scheme
    ///
    /// The result includes scheme tag, parameters and a fresh random salt,
    /// so hashing the same password twice yields different strings.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

        Ok(format!("{{{CURRENT_SCHEME}}}{password_hash}"))
    }

    /// Verify a plaintext password against a stored, scheme-tagged hash
    ///
    /// # Returns
    ///
    /// * `Ok(Verification)` - whether it matched and whether the hash is outdated
    /// * `Err(PasswordError::CorruptCredential)` - missing/unknown scheme or unparseable hash
    pub fn verify(&self, password: &str, stored: &str) -> Result<Verification, PasswordError> {
        let (scheme, encoded) = split_scheme(stored)?;

        match scheme {
            CURRENT_SCHEME => self.verify_argon2(password, encoded),
            LEGACY_PLAINTEXT_SCHEME => Ok(Verification {
                matches: encoded == password,
                outdated: true,
            }),
            other => Err(PasswordError::CorruptCredential(format!(
                "unsupported password scheme '{other}'"
            ))),
        }
    }

    fn verify_argon2(&self, password: &str, encoded: &str) -> Result<Verification, PasswordError> {
        let parsed = PasswordHash::new(encoded)
            .map_err(|e| PasswordError::CorruptCredential(e.to_string()))?;

        // Verification always uses the parameters embedded in the hash
        let matches = match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => true,
            Err(argon2::password_hash::Error::Password) => false,
            Err(e) => return Err(PasswordError::VerificationFailed(e.to_string())),
        };

        Ok(Verification {
            matches,
            outdated: !self.is_current(&parsed),
        })
    }

    /// Whether a parsed Argon2 hash was produced with the configured parameters
    fn is_current(&self, parsed: &PasswordHash<'_>) -> bool {
        if parsed.algorithm != Algorithm::Argon2id.ident() {
            return false;
        }
        if parsed.version != Some(Version::V0x13.into()) {
            return false;
        }
        let Ok(stored) = Params::try_from(parsed) else {
            return false;
        };
        let output_len = parsed.hash.map(|h| h.len());

        stored.m_cost() == self.params.m_cost()
            && stored.t_cost() == self.params.t_cost()
            && stored.p_cost() == self.params.p_cost()
            && output_len == self.params.output_len()
    }
}

/// Split `{scheme}rest` into `(scheme, rest)`
fn split_scheme(stored: &str) -> Result<(&str, &str), PasswordError> {
    stored
        .strip_prefix('{')
        .and_then(|rest| rest.split_once('}'))
        .filter(|(scheme, _)| !scheme.is_empty())
        .ok_or_else(|| PasswordError::CorruptCredential("missing scheme prefix".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> PasswordConfig {
        PasswordConfig {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
            output_len: 32,
        }
    }

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(&fast_config()).unwrap()
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hasher = hasher();
        let hash = hasher.hash("secret1").expect("Failed to hash password");

        assert!(hash.starts_with("{argon2}$argon2id$"));

        let ok = hasher.verify("secret1", &hash).expect("Verification failed");
        assert_eq!(
            ok,
            Verification {
                matches: true,
                outdated: false
            }
        );

        let wrong = hasher.verify("secret2", &hash).expect("Verification failed");
        assert!(!wrong.matches);
    }

    #[test]
    fn test_same_password_produces_different_hashes() {
        let hasher = hasher();
        let hash1 = hasher.hash("SamePassword").unwrap();
        let hash2 = hasher.hash("SamePassword").unwrap();

        assert_ne!(hash1, hash2);
        assert!(hasher.verify("SamePassword", &hash1).unwrap().matches);
        assert!(hasher.verify("SamePassword", &hash2).unwrap().matches);
    }

    #[test]
    fn test_noop_scheme_is_always_outdated() {
        let hasher = hasher();

        let ok = hasher.verify("password", "{noop}password").unwrap();
        assert!(ok.matches);
        assert!(ok.outdated);

        let wrong = hasher.verify("other", "{noop}password").unwrap();
        assert!(!wrong.matches);
    }

    #[test]
    fn test_changed_parameters_mark_hash_outdated() {
        let old = hasher().hash("secret1").unwrap();

        let stronger = PasswordHasher::new(&PasswordConfig {
            time_cost: 2,
            ..fast_config()
        })
        .unwrap();

        let result = stronger.verify("secret1", &old).unwrap();
        assert!(result.matches);
        assert!(result.outdated);
    }

    #[test]
    fn test_custom_config_parameters_in_hash() {
        let hash = PasswordHasher::new(&PasswordConfig {
            memory_cost: 2048,
            time_cost: 2,
            parallelism: 1,
            output_len: 32,
        })
        .unwrap()
        .hash("TestPassword")
        .unwrap();

        assert!(hash.contains("m=2048"));
        assert!(hash.contains("t=2"));
        assert!(hash.contains("p=1"));
    }

    #[test]
    fn test_corrupt_credentials() {
        let hasher = hasher();

        for stored in [
            "invalid-hash-format",
            "{}password",
            "{argon2}not-a-phc-string",
            "{bcrypt}$2a$10$abcdefghijklmnopqrstuv",
        ] {
            let result = hasher.verify("password", stored);
            assert!(
                matches!(result, Err(PasswordError::CorruptCredential(_))),
                "expected corrupt credential for {stored}"
            );
        }
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let result = PasswordHasher::new(&PasswordConfig {
            memory_cost: 1,
            ..fast_config()
        });
        assert!(matches!(result, Err(PasswordError::HashingFailed(_))));
    }
}
