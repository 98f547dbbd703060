//! Password hashing and verification.
//!
//! Argon2id with OWASP-recommended parameters (memory: 19 MiB,
//! iterations: 2, parallelism: 1). Salt is randomly generated per
//! hash. An optional pepper (server-side secret) can be provided at
//! construction time.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher as _, PasswordVerifier};

use crate::error::CryptoError;

/// The hashing capability the login and registration flows depend on.
/// The algorithm is an implementation detail behind this seam.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, CryptoError>;

    /// `Ok(false)` on mismatch; errors only for malformed stored
    /// hashes.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, CryptoError>;
}

/// Argon2id implementation of [`PasswordHasher`].
#[derive(Clone, Default)]
pub struct Argon2PasswordHasher {
    pepper: Option<String>,
}

impl Argon2PasswordHasher {
    pub fn new(pepper: Option<String>) -> Self {
        Self { pepper }
    }

    fn peppered(&self, password: &str) -> String {
        match &self.pepper {
            Some(p) => format!("{p}{password}"),
            None => password.to_string(),
        }
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, CryptoError> {
        // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
        let params = argon2::Params::new(19456, 2, 1, None)
            .map_err(|e| CryptoError::PasswordHash(format!("argon2 params error: {e}")))?;
        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

        let input = self.peppered(password);
        let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
        let hash = argon2
            .hash_password(input.as_bytes(), &salt)
            .map_err(|e| CryptoError::PasswordHash(format!("password hash error: {e}")))?;

        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, CryptoError> {
        let input = self.peppered(password);

        let parsed_hash = argon2::PasswordHash::new(hash)
            .map_err(|e| CryptoError::PasswordHash(format!("invalid hash format: {e}")))?;

        // Parameters are read back from the hash string itself.
        match Argon2::default().verify_password(input.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(CryptoError::PasswordHash(format!("verify error: {e}"))),
        }
    }
}
