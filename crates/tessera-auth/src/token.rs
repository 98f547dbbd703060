//! JWT access tokens and opaque refresh tokens.
//!
//! Access tokens are HS256 JWTs signed with the owning tenant's
//! `JWT_SECRET`. Validation is a two-phase protocol: the `TenantId`
//! claim is read from the unsigned token solely to locate the signing
//! key, then the token is fully verified against that key with zero
//! clock-skew leeway.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tessera_core::models::role::Role;
use tessera_core::models::tenant::Tenant;
use tessera_core::models::user::User;
use tessera_core::repository::SecretRepository;
use tracing::{error, warn};

use crate::config::AuthConfig;
use crate::error::{AuthError, CryptoError, TokenError};
use crate::secrets::{JWT_SECRET_KEY, SecretService};

/// Claims carried by every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject — the user ID.
    pub sub: String,
    /// Display name.
    pub name: String,
    pub email: String,
    /// Role name.
    pub role: String,
    /// Tenant ID as a string-encoded integer. Read *before* signature
    /// verification to select the signing key, and trusted for
    /// nothing else.
    #[serde(rename = "TenantId")]
    pub tenant_id: String,
    #[serde(rename = "TenantName")]
    pub tenant_name: String,
    pub iss: String,
    pub aud: String,
    /// Issued-at, Unix seconds.
    pub iat: i64,
    /// Expiry, Unix seconds.
    pub exp: i64,
}

/// Extract the `TenantId` claim without verifying the signature.
///
/// The only place an unsigned claim is ever read. Its result selects
/// which signing key full validation runs against — a forged
/// `TenantId` selects the wrong key and fails signature verification,
/// so it can never validate a token against another tenant's key.
pub fn peek_tenant_id(token: &str) -> Result<i64, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = jsonwebtoken::decode::<serde_json::Value>(
        token,
        &DecodingKey::from_secret(&[]),
        &validation,
    )
    .map_err(|_| TokenError::Malformed)?;

    data.claims
        .get("TenantId")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or(TokenError::TenantMissing)
}

/// Generate an opaque refresh token: 32 random bytes, base64url
/// without padding. Carries no claims and means nothing until matched
/// against its stored hash.
pub fn generate_refresh_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rand::Rng::random(&mut rng);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 of a raw refresh token, hex-encoded — the only form ever
/// persisted.
pub fn hash_refresh_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

/// Issues and validates access tokens with per-tenant signing keys.
#[derive(Clone)]
pub struct TokenService<S: SecretRepository> {
    secrets: SecretService<S>,
    config: AuthConfig,
}

impl<S: SecretRepository> TokenService<S> {
    pub fn new(secrets: SecretService<S>, config: AuthConfig) -> Self {
        Self { secrets, config }
    }

    /// Issue a signed HS256 access token for `user`.
    pub async fn issue_access_token(
        &self,
        user: &User,
        tenant: &Tenant,
        role: &Role,
    ) -> Result<String, AuthError> {
        let secret = self.resolve_signing_secret(user.tenant_id).await?;

        let now = Utc::now().timestamp();
        let claims = AccessTokenClaims {
            sub: user.id.to_string(),
            name: user.display_name(),
            email: user.email.clone(),
            role: role.name.clone(),
            tenant_id: user.tenant_id.to_string(),
            tenant_name: tenant.name.clone(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
            iat: now,
            exp: now + self.config.access_token_lifetime_secs as i64,
        };

        let key = EncodingKey::from_secret(secret.as_bytes());
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &key)
            .map_err(|e| AuthError::Crypto(CryptoError::Encryption(e.to_string())))
    }

    /// Full two-phase validation: signature, expiry (zero leeway),
    /// issuer, and audience against the owning tenant's key.
    pub async fn validate(&self, token: &str) -> Result<AccessTokenClaims, TokenError> {
        self.validate_inner(token, true).await
    }

    /// Validate signature, issuer, and audience but tolerate an
    /// expired token. Used by the refresh and revoke flows, where the
    /// access token has usually expired already.
    pub async fn validate_ignoring_expiry(
        &self,
        token: &str,
    ) -> Result<AccessTokenClaims, TokenError> {
        self.validate_inner(token, false).await
    }

    async fn validate_inner(
        &self,
        token: &str,
        check_expiry: bool,
    ) -> Result<AccessTokenClaims, TokenError> {
        // Phase 1: unsigned read, key selection only.
        let tenant_id = peek_tenant_id(token)?;
        let secret = self.resolve_signing_secret(tenant_id).await?;

        // Phase 2: full verification against that tenant's key.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = check_expiry;
        validation.set_issuer(&[&self.config.jwt_issuer]);
        validation.set_audience(&[&self.config.jwt_audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);

        let key = DecodingKey::from_secret(secret.as_bytes());
        let data = jsonwebtoken::decode::<AccessTokenClaims>(token, &key, &validation)
            .map_err(|e| classify_validation_error(&e, tenant_id))?;

        Ok(data.claims)
    }

    /// Resolve the tenant's `JWT_SECRET`. Absence or a decrypt
    /// failure is terminal — there is no global fallback key.
    async fn resolve_signing_secret(&self, tenant_id: i64) -> Result<String, TokenError> {
        match self.secrets.get_secret_value(JWT_SECRET_KEY, tenant_id).await {
            Ok(Some(secret)) => Ok(secret),
            Ok(None) => {
                error!(tenant_id, "no active JWT signing secret for tenant");
                Err(TokenError::SigningKeyUnavailable)
            }
            Err(e) => {
                error!(tenant_id, error = %e, "failed to resolve tenant signing secret");
                Err(TokenError::SigningKeyUnavailable)
            }
        }
    }
}

fn classify_validation_error(err: &jsonwebtoken::errors::Error, tenant_id: i64) -> TokenError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::ExpiredSignature => {
            warn!(tenant_id, "token rejected: expired");
            TokenError::Expired
        }
        ErrorKind::InvalidSignature => {
            warn!(tenant_id, "token rejected: signature invalid");
            TokenError::SignatureInvalid
        }
        ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => {
            warn!(tenant_id, "token rejected: issuer/audience mismatch");
            TokenError::IssuerAudienceMismatch
        }
        ErrorKind::InvalidToken
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => TokenError::Malformed,
        _ => {
            warn!(tenant_id, error = %err, "token rejected");
            TokenError::SignatureInvalid
        }
    }
}
