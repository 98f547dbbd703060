//! Authentication error types and conversions.

use tessera_core::error::CoreError;
use thiserror::Error;

/// Token validation failures, one variant per protocol step.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Not a structurally valid JWT.
    #[error("malformed token")]
    Malformed,

    /// No integer-parseable `TenantId` claim. There is no global
    /// fallback signing key, so validation cannot proceed.
    #[error("token carries no valid TenantId claim")]
    TenantMissing,

    /// The tenant has no usable `JWT_SECRET`. Operational failure:
    /// logged loudly, surfaced to callers as a generic rejection.
    #[error("no signing key available for tenant")]
    SigningKeyUnavailable,

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("token has expired")]
    Expired,

    #[error("token issuer or audience mismatch")]
    IssuerAudienceMismatch,
}

/// Failures in the encryption and password-hashing primitives.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Tampered, truncated, or wrong-key ciphertext. GCM
    /// authentication guarantees this never yields garbage plaintext.
    #[error("decryption failed")]
    Decryption,

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("password hash error: {0}")]
    PasswordHash(String),
}

/// Errors surfaced by the authentication use cases.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown user, inactive user, inactive tenant, and wrong
    /// password all collapse into this so the API cannot be used to
    /// enumerate accounts.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is temporarily locked after repeated failed attempts")]
    AccountLocked,

    /// Missing, expired, revoked, or replayed refresh token.
    #[error("refresh token is invalid")]
    RefreshTokenInvalid,

    #[error("email is already registered")]
    EmailTaken,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Repository(#[from] CoreError),
}

impl From<CryptoError> for CoreError {
    fn from(err: CryptoError) -> Self {
        CoreError::Crypto(err.to_string())
    }
}

impl From<AuthError> for CoreError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Repository(inner) => inner,
            AuthError::Crypto(e) => CoreError::Crypto(e.to_string()),
            other => CoreError::AuthenticationFailed {
                reason: other.to_string(),
            },
        }
    }
}
