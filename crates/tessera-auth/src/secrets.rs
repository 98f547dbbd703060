//! Tenant-scoped secret management — encrypt on write, decrypt on
//! read.
//!
//! The repository below this service only ever sees ciphertext.
//! Context keys bind each ciphertext to its scope, so a value copied
//! between tenants (or between a tenant and a user scope) will not
//! decrypt.

use chrono::{DateTime, Utc};
use tessera_core::error::CoreResult;
use tessera_core::models::secret::{SaveSecret, Secret};
use tessera_core::repository::SecretRepository;
use tracing::{error, info, warn};

use crate::crypto::EncryptionService;

/// Well-known key holding a tenant's JWT signing secret.
pub const JWT_SECRET_KEY: &str = "JWT_SECRET";

/// Minimum HMAC-SHA256 signing key length in bytes.
const MIN_JWT_KEY_BYTES: usize = 32;

/// Secret access with transparent encryption.
#[derive(Clone)]
pub struct SecretService<S: SecretRepository> {
    repo: S,
    crypto: EncryptionService,
}

impl<S: SecretRepository> SecretService<S> {
    pub fn new(repo: S, crypto: EncryptionService) -> Self {
        Self { repo, crypto }
    }

    fn tenant_context_key(key: &str, tenant_id: i64) -> String {
        format!("{key}_{tenant_id}")
    }

    fn user_context_key(key: &str, tenant_id: i64, user_id: i64) -> String {
        format!("{key}_{tenant_id}_{user_id}")
    }

    /// Fetch and decrypt a tenant-wide secret.
    ///
    /// Returns `Ok(None)` when no active, unexpired secret exists, or
    /// when a `JWT_SECRET` decrypts to something too short to sign
    /// with. Decryption failures are errors — the stored ciphertext
    /// is never handed back as a fallback value.
    pub async fn get_secret_value(&self, key: &str, tenant_id: i64) -> CoreResult<Option<String>> {
        let Some(secret) = self.repo.get(key, tenant_id, None).await? else {
            warn!(key, tenant_id, "no active secret found");
            return Ok(None);
        };

        let value = self.decrypt_value(&secret, &Self::tenant_context_key(key, tenant_id))?;

        if key == JWT_SECRET_KEY && value.len() < MIN_JWT_KEY_BYTES {
            error!(tenant_id, "tenant JWT secret is too short to sign with");
            return Ok(None);
        }

        Ok(Some(value))
    }

    /// Fetch and decrypt a user-scoped secret.
    pub async fn get_user_secret_value(
        &self,
        key: &str,
        tenant_id: i64,
        user_id: i64,
    ) -> CoreResult<Option<String>> {
        let Some(secret) = self.repo.get(key, tenant_id, Some(user_id)).await? else {
            return Ok(None);
        };

        let context_key = Self::user_context_key(key, tenant_id, user_id);
        Ok(Some(self.decrypt_value(&secret, &context_key)?))
    }

    /// Encrypt and upsert a tenant-wide secret.
    pub async fn set_secret(
        &self,
        key: &str,
        value: &str,
        tenant_id: i64,
        description: &str,
        expiration_date: Option<DateTime<Utc>>,
    ) -> CoreResult<Secret> {
        let encrypted = self
            .crypto
            .encrypt(value, &Self::tenant_context_key(key, tenant_id))?;

        let saved = self
            .repo
            .save(SaveSecret {
                tenant_id,
                user_id: None,
                key: key.to_string(),
                encrypted_value: encrypted,
                is_encrypted: true,
                description: description.to_string(),
                expiration_date,
            })
            .await?;

        info!(key, tenant_id, "secret saved");
        Ok(saved)
    }

    /// Encrypt and upsert a user-scoped secret.
    pub async fn set_user_secret(
        &self,
        key: &str,
        value: &str,
        tenant_id: i64,
        user_id: i64,
        description: &str,
        expiration_date: Option<DateTime<Utc>>,
    ) -> CoreResult<Secret> {
        let encrypted = self
            .crypto
            .encrypt(value, &Self::user_context_key(key, tenant_id, user_id))?;

        let saved = self
            .repo
            .save(SaveSecret {
                tenant_id,
                user_id: Some(user_id),
                key: key.to_string(),
                encrypted_value: encrypted,
                is_encrypted: true,
                description: description.to_string(),
                expiration_date,
            })
            .await?;

        info!(key, tenant_id, user_id, "user secret saved");
        Ok(saved)
    }

    /// Soft-delete a tenant-wide secret.
    pub async fn deactivate(&self, key: &str, tenant_id: i64) -> CoreResult<()> {
        self.repo.deactivate(key, tenant_id).await?;
        info!(key, tenant_id, "secret deactivated");
        Ok(())
    }

    pub async fn exists(&self, key: &str, tenant_id: i64) -> CoreResult<bool> {
        self.repo.exists(key, tenant_id).await
    }

    fn decrypt_value(
        &self,
        secret: &Secret,
        context_key: &str,
    ) -> Result<String, tessera_core::CoreError> {
        if !secret.is_encrypted {
            // Legacy plaintext row.
            return Ok(secret.encrypted_value.clone());
        }

        self.crypto
            .decrypt(&secret.encrypted_value, context_key)
            .map_err(|e| {
                error!(
                    key = %secret.key,
                    tenant_id = secret.tenant_id,
                    "failed to decrypt stored secret"
                );
                e.into()
            })
    }
}
